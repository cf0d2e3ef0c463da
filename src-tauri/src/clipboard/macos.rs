use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::debug;

use super::{ClipboardError, ClipboardService};

// pbpaste/pbcopy follow the locale; pin it so non-ASCII text survives.
const UTF8_LOCALE: &str = "en_US.UTF-8";

#[derive(Debug, Clone)]
pub struct MacOsClipboard {
    read_timeout: Duration,
}

impl MacOsClipboard {
    pub fn new(read_timeout: Duration) -> Self {
        Self { read_timeout }
    }

    fn read_via_pbpaste(&self) -> Result<Option<String>, ClipboardError> {
        let mut child = Command::new("pbpaste")
            .env("LANG", UTF8_LOCALE)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClipboardError::Command("failed to open pbpaste stdout".to_string()))?;

        // Drain on a helper thread so a large clipboard cannot fill the pipe
        // and stall the child past the deadline.
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let result = stdout.read_to_end(&mut buffer).map(|_| buffer);
            let _ = tx.send(result);
        });

        let bytes = match rx.recv_timeout(self.read_timeout) {
            Ok(result) => result?,
            Err(_) => {
                debug!("pbpaste did not answer within {:?}", self.read_timeout);
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
        };

        let status = child.wait()?;
        if !status.success() {
            return Err(ClipboardError::Command("pbpaste exited unsuccessfully".to_string()));
        }
        if bytes.is_empty() {
            return Ok(None);
        }

        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

impl ClipboardService for MacOsClipboard {
    fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        self.read_via_pbpaste()
    }

    fn set_content(&self, content: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new("pbcopy")
            .env("LANG", UTF8_LOCALE)
            .stdin(Stdio::piped())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClipboardError::Command("failed to open pbcopy stdin".to_string()))?;
        stdin.write_all(content.as_bytes())?;
        drop(stdin);

        let status = child.wait()?;
        if !status.success() {
            return Err(ClipboardError::Command("pbcopy exited unsuccessfully".to_string()));
        }

        Ok(())
    }
}
