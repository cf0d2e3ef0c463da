use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::clipboard::ClipboardService;
use crate::db::{Clip, Database, RecordOutcome};
use crate::error::{AppError, AppResult};
use crate::utils::hash::fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Paused,
    /// Clipboard empty, unreadable, or whitespace only.
    NoContent,
    Unchanged,
    /// Clipboard still holds text this process wrote.
    Echo,
    /// This process wrote the clipboard while the read was in flight, so the
    /// text read may predate the write. The next tick reads again.
    Superseded,
    Recorded(RecordOutcome),
}

#[derive(Debug)]
struct WatcherContext {
    state: WatcherState,
    last_recorded: Option<String>,
    last_written: Option<String>,
    /// Bumped by every clipboard write.
    writes: u64,
}

/// Polls the clipboard and feeds new text into the history store.
///
/// Every comparison against `last_written` and every `record` call happen
/// while the context lock is held. `pause` and `set_clipboard` take the same
/// lock, so once either returns the next poll step already observes it.
pub struct ClipWatcher {
    db: Arc<Database>,
    clipboard: Arc<dyn ClipboardService>,
    context: Mutex<WatcherContext>,
}

impl ClipWatcher {
    pub fn new(db: Arc<Database>, clipboard: Arc<dyn ClipboardService>) -> Self {
        Self {
            db,
            clipboard,
            context: Mutex::new(WatcherContext {
                state: WatcherState::Running,
                last_recorded: None,
                last_written: None,
                writes: 0,
            }),
        }
    }

    // The context is plain data that stays consistent even if a holder
    // panicked, so a poisoned lock is recovered instead of propagated.
    fn context(&self) -> MutexGuard<'_, WatcherContext> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn state(&self) -> WatcherState {
        self.context().state
    }

    pub fn is_paused(&self) -> bool {
        self.state() == WatcherState::Paused
    }

    pub fn pause(&self) {
        self.context().state = WatcherState::Paused;
    }

    pub fn resume(&self) {
        self.context().state = WatcherState::Running;
    }

    pub fn toggle(&self) -> WatcherState {
        let mut context = self.context();
        context.state = match context.state {
            WatcherState::Running => WatcherState::Paused,
            WatcherState::Paused => WatcherState::Running,
        };
        context.state
    }

    /// One poll step. Read failures count as "no content"; only storage
    /// failures come back as errors.
    pub fn poll_once(&self) -> AppResult<PollOutcome> {
        let generation = {
            let context = self.context();
            if context.state == WatcherState::Paused {
                return Ok(PollOutcome::Paused);
            }
            context.writes
        };

        let content = match self.clipboard.read_text() {
            Ok(Some(content)) if !content.trim().is_empty() => content,
            Ok(_) => return Ok(PollOutcome::NoContent),
            Err(err) => {
                debug!("clipboard read failed: {err}");
                return Ok(PollOutcome::NoContent);
            }
        };
        let fingerprint = fingerprint(&content);

        let mut context = self.context();
        if context.state == WatcherState::Paused {
            return Ok(PollOutcome::Paused);
        }
        if context.writes != generation {
            return Ok(PollOutcome::Superseded);
        }

        if context.last_written.as_deref() == Some(fingerprint.as_str()) {
            context.last_recorded = Some(fingerprint);
            return Ok(PollOutcome::Echo);
        }
        context.last_written = None;

        if context.last_recorded.as_deref() == Some(fingerprint.as_str()) {
            return Ok(PollOutcome::Unchanged);
        }

        let outcome = self.db.record(&content)?;
        context.last_recorded = Some(fingerprint);
        if let RecordOutcome::Inserted { clip, evicted } = &outcome {
            debug!("recorded clip {} ({} evicted)", clip.id, evicted.len());
        }
        Ok(PollOutcome::Recorded(outcome))
    }

    /// Writes `text` to the clipboard and marks it as self-written so the
    /// next poll does not record it again.
    pub fn set_clipboard(&self, text: &str) -> AppResult<()> {
        let mut context = self.context();
        // Counted even if the write fails, a partial write may still have
        // replaced the clipboard.
        context.writes = context.writes.wrapping_add(1);
        self.clipboard.set_content(text)?;
        context.last_written = Some(fingerprint(text));
        Ok(())
    }

    /// Copies a stored entry back to the clipboard. `None` if the id is gone.
    pub fn copy_clip(&self, id: i64) -> AppResult<Option<Clip>> {
        let Some(clip) = self.db.get_clip(id)? else {
            return Ok(None);
        };
        self.set_clipboard(&clip.content)?;
        Ok(Some(clip))
    }

    /// Starts the poll thread. `on_record` runs on that thread after every
    /// poll that inserted or touched an entry.
    pub fn spawn<F>(self: &Arc<Self>, interval: Duration, on_record: F) -> AppResult<WatcherHandle>
    where
        F: Fn(&RecordOutcome) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let watcher = Arc::clone(self);

        let join = thread::Builder::new()
            .name("clipflow-watcher".to_string())
            .spawn(move || {
                info!("clipboard watcher started, polling every {interval:?}");
                loop {
                    match watcher.poll_once() {
                        Ok(PollOutcome::Recorded(outcome)) => on_record(&outcome),
                        Ok(_) => {}
                        Err(err) => warn!("clipboard poll failed: {err}"),
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("clipboard watcher stopped");
            })
            .map_err(|err| AppError::Internal(format!("failed to spawn watcher thread: {err}")))?;

        Ok(WatcherHandle {
            stop: Some(stop_tx),
            join: Some(join),
        })
    }
}

/// Owns the poll thread. Stopping (or dropping) joins it, so no `record`
/// happens after `stop` returns.
pub struct WatcherHandle {
    stop: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("clipboard watcher thread panicked");
            }
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
