use std::sync::{Mutex, MutexGuard};

use arboard::Clipboard;

use super::{ClipboardError, ClipboardService};

/// arboard-backed clipboard for platforms without pbpaste/pbcopy.
pub struct SystemClipboard {
    inner: Mutex<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let clipboard = Clipboard::new().map_err(|err| ClipboardError::Unavailable(err.to_string()))?;
        Ok(Self {
            inner: Mutex::new(clipboard),
        })
    }

    fn clipboard(&self) -> Result<MutexGuard<'_, Clipboard>, ClipboardError> {
        self.inner
            .lock()
            .map_err(|_| ClipboardError::Unavailable("clipboard lock poisoned".to_string()))
    }
}

impl ClipboardService for SystemClipboard {
    fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        match self.clipboard()?.get_text() {
            Ok(text) if text.is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(err) => Err(ClipboardError::Unavailable(err.to_string())),
        }
    }

    fn set_content(&self, content: &str) -> Result<(), ClipboardError> {
        self.clipboard()?
            .set_text(content.to_string())
            .map_err(|err| ClipboardError::Unavailable(err.to_string()))
    }
}
