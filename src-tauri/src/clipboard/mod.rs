use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(test)]
pub mod memory;
#[cfg(not(target_os = "macos"))]
pub mod system;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard command failed: {0}")]
    Command(String),
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text access to the OS clipboard.
///
/// `read_text` returns `Ok(None)` when the clipboard holds no text or the read
/// timed out; callers treat both as "nothing changed".
pub trait ClipboardService: Send + Sync {
    fn read_text(&self) -> Result<Option<String>, ClipboardError>;
    fn set_content(&self, content: &str) -> Result<(), ClipboardError>;
}

#[cfg(target_os = "macos")]
pub fn default_service(read_timeout: Duration) -> Result<Arc<dyn ClipboardService>, ClipboardError> {
    Ok(Arc::new(macos::MacOsClipboard::new(read_timeout)))
}

#[cfg(not(target_os = "macos"))]
pub fn default_service(read_timeout: Duration) -> Result<Arc<dyn ClipboardService>, ClipboardError> {
    let _ = read_timeout;
    Ok(Arc::new(system::SystemClipboard::new()?))
}
