use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AppResult;
use crate::services::login_item::LoginItemRegistrar;
use crate::services::watcher::{ClipWatcher, WatcherState};
use crate::utils::text::preview;

const NOTICE_PREVIEW_LEN: usize = 50;

/// Everything a presentation surface can ask the core to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Copy(i64),
    TogglePin(i64),
    Delete(i64),
    Clear,
    PauseResume,
    ToggleLogin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Completed; carries a one-line notification.
    Done(String),
    /// The target entry no longer exists. Nothing changed.
    NotFound(i64),
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Done(notice) => f.write_str(notice),
            ActionOutcome::NotFound(id) => write!(f, "No clip with id {id}"),
        }
    }
}

/// Routes actions to the store, watcher and login registrar.
///
/// The login item state is queried once up front and then tracked through
/// `ToggleLogin`, so menu renders never wait on the registrar.
pub struct Dispatcher {
    watcher: Arc<ClipWatcher>,
    login_items: Arc<dyn LoginItemRegistrar>,
    login_enabled: AtomicBool,
}

impl Dispatcher {
    pub fn new(watcher: Arc<ClipWatcher>, login_items: Arc<dyn LoginItemRegistrar>) -> Self {
        let dispatcher = Self {
            watcher,
            login_items,
            login_enabled: AtomicBool::new(false),
        };
        dispatcher.refresh_login_state();
        dispatcher
    }

    pub fn watcher(&self) -> &Arc<ClipWatcher> {
        &self.watcher
    }

    pub fn login_enabled(&self) -> bool {
        self.login_enabled.load(Ordering::SeqCst)
    }

    /// Re-reads the registrar. On failure the last known state is kept.
    pub fn refresh_login_state(&self) -> bool {
        match self.login_items.is_enabled() {
            Ok(enabled) => self.login_enabled.store(enabled, Ordering::SeqCst),
            Err(err) => warn!("failed to query start on login: {err}"),
        }
        self.login_enabled()
    }

    pub fn dispatch(&self, action: Action) -> AppResult<ActionOutcome> {
        let db = self.watcher.db();
        let outcome = match action {
            Action::Copy(id) => match self.watcher.copy_clip(id)? {
                Some(clip) => ActionOutcome::Done(format!(
                    "Copied: {}",
                    preview(&clip.content, NOTICE_PREVIEW_LEN)
                )),
                None => ActionOutcome::NotFound(id),
            },
            Action::TogglePin(id) => match db.toggle_pin(id)? {
                Some(true) => ActionOutcome::Done("Pinned".to_string()),
                Some(false) => ActionOutcome::Done("Unpinned".to_string()),
                None => ActionOutcome::NotFound(id),
            },
            Action::Delete(id) => match db.delete(id)? {
                Some(_) => ActionOutcome::Done("Deleted".to_string()),
                None => ActionOutcome::NotFound(id),
            },
            Action::Clear => {
                let removed = db.clear_unpinned()?;
                ActionOutcome::Done(format!("History cleared ({removed} removed, pins kept)"))
            }
            Action::PauseResume => match self.watcher.toggle() {
                WatcherState::Paused => ActionOutcome::Done("Monitoring paused".to_string()),
                WatcherState::Running => ActionOutcome::Done("Monitoring resumed".to_string()),
            },
            Action::ToggleLogin => {
                let enabled = self.login_items.is_enabled()?;
                self.login_enabled.store(enabled, Ordering::SeqCst);
                if enabled {
                    self.login_items.disable()?;
                    self.login_enabled.store(false, Ordering::SeqCst);
                    ActionOutcome::Done("Start on login disabled".to_string())
                } else {
                    self.login_items.enable()?;
                    self.login_enabled.store(true, Ordering::SeqCst);
                    ActionOutcome::Done("Start on login enabled".to_string())
                }
            }
        };

        info!("{action:?}: {outcome}");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::clipboard::memory::MemoryClipboard;
    use crate::db::{Database, RecordOutcome};
    use crate::error::AppError;
    use crate::services::login_item::LoginItemError;

    #[derive(Default)]
    struct FakeLoginItems {
        enabled: AtomicBool,
        refuse_enable: AtomicBool,
        queries: AtomicUsize,
    }

    impl LoginItemRegistrar for FakeLoginItems {
        fn is_enabled(&self) -> Result<bool, LoginItemError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.enabled.load(Ordering::SeqCst))
        }

        fn enable(&self) -> Result<(), LoginItemError> {
            if self.refuse_enable.load(Ordering::SeqCst) {
                return Err(LoginItemError::Unsupported);
            }
            self.enabled.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn disable(&self) -> Result<(), LoginItemError> {
            self.enabled.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Fixture {
        dispatcher: Dispatcher,
        clipboard: Arc<MemoryClipboard>,
        login: Arc<FakeLoginItems>,
        db: Arc<Database>,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(Database::new_in_memory(10).expect("db init"));
        let clipboard = Arc::new(MemoryClipboard::new());
        let login = Arc::new(FakeLoginItems::default());
        let watcher = Arc::new(ClipWatcher::new(db.clone(), clipboard.clone()));
        Fixture {
            dispatcher: Dispatcher::new(watcher, login.clone()),
            clipboard,
            login,
            db,
        }
    }

    fn stored_id(db: &Database, content: &str) -> i64 {
        match db.record(content).expect("record") {
            RecordOutcome::Inserted { clip, .. } | RecordOutcome::Touched(clip) => clip.id,
            RecordOutcome::Skipped => panic!("content was skipped"),
        }
    }

    #[test]
    fn copy_writes_clipboard_and_reports_preview() {
        let fx = fixture();
        let id = stored_id(&fx.db, "line one\nline two");

        let outcome = fx.dispatcher.dispatch(Action::Copy(id)).expect("copy");
        assert_eq!(outcome, ActionOutcome::Done("Copied: line one ↵ line two".to_string()));
        assert_eq!(fx.clipboard.current().as_deref(), Some("line one\nline two"));
        assert_eq!(fx.db.count().expect("count"), 1);
    }

    #[test]
    fn missing_ids_are_not_errors() {
        let fx = fixture();
        for action in [Action::Copy(9), Action::TogglePin(9), Action::Delete(9)] {
            assert_eq!(
                fx.dispatcher.dispatch(action).expect("dispatch"),
                ActionOutcome::NotFound(9)
            );
        }
        assert_eq!(fx.clipboard.writes(), 0);
    }

    #[test]
    fn pin_delete_and_clear_mutate_store() {
        let fx = fixture();
        let keep = stored_id(&fx.db, "keep");
        let drop_me = stored_id(&fx.db, "drop");
        stored_id(&fx.db, "loose");

        assert_eq!(
            fx.dispatcher.dispatch(Action::TogglePin(keep)).expect("pin"),
            ActionOutcome::Done("Pinned".to_string())
        );
        fx.dispatcher.dispatch(Action::Delete(drop_me)).expect("delete");
        fx.dispatcher.dispatch(Action::Clear).expect("clear");

        let remaining = fx.db.list(10, true).expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep);
    }

    #[test]
    fn pause_resume_toggles_watcher() {
        let fx = fixture();
        fx.dispatcher.dispatch(Action::PauseResume).expect("pause");
        assert!(fx.dispatcher.watcher().is_paused());
        fx.dispatcher.dispatch(Action::PauseResume).expect("resume");
        assert!(!fx.dispatcher.watcher().is_paused());
    }

    #[test]
    fn toggle_login_round_trips_through_registrar() {
        let fx = fixture();
        fx.dispatcher.dispatch(Action::ToggleLogin).expect("enable");
        assert!(fx.dispatcher.login_enabled());
        fx.dispatcher.dispatch(Action::ToggleLogin).expect("disable");
        assert!(!fx.login.enabled.load(Ordering::SeqCst));
    }

    #[test]
    fn login_state_is_cached_between_toggles() {
        let fx = fixture();
        let after_startup = fx.login.queries.load(Ordering::SeqCst);
        for _ in 0..5 {
            assert!(!fx.dispatcher.login_enabled());
        }
        assert_eq!(fx.login.queries.load(Ordering::SeqCst), after_startup);

        fx.dispatcher.dispatch(Action::ToggleLogin).expect("enable");
        assert!(fx.dispatcher.login_enabled());

        fx.login.enabled.store(false, Ordering::SeqCst);
        assert!(fx.dispatcher.login_enabled());
        assert!(!fx.dispatcher.refresh_login_state());
    }

    #[test]
    fn login_failure_surfaces_as_error() {
        let fx = fixture();
        fx.login.refuse_enable.store(true, Ordering::SeqCst);
        let result = fx.dispatcher.dispatch(Action::ToggleLogin);
        assert!(matches!(result, Err(AppError::LoginItem(_))));
        assert!(!fx.dispatcher.login_enabled());
    }

    #[test]
    fn clipboard_write_failure_surfaces_as_error() {
        let fx = fixture();
        let id = stored_id(&fx.db, "text");
        fx.clipboard.set_fail_writes(true);
        let result = fx.dispatcher.dispatch(Action::Copy(id));
        assert!(matches!(result, Err(AppError::Clipboard(_))));
    }
}
