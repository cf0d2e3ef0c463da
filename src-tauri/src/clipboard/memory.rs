use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{ClipboardError, ClipboardService};

/// In-process clipboard used by tests in place of the OS one.
#[derive(Default)]
pub struct MemoryClipboard {
    content: Mutex<Option<String>>,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates another application copying `text`.
    pub fn external_copy(&self, text: &str) {
        if let Ok(mut content) = self.content.lock() {
            *content = Some(text.to_string());
        }
    }

    pub fn current(&self) -> Option<String> {
        self.content.lock().ok().and_then(|content| content.clone())
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl ClipboardService for MemoryClipboard {
    fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ClipboardError::Unavailable("simulated read failure".to_string()));
        }
        Ok(self.current())
    }

    fn set_content(&self, content: &str) -> Result<(), ClipboardError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClipboardError::Unavailable("simulated write failure".to_string()));
        }
        self.external_copy(content);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
