use tauri::{AppHandle, Runtime};
use tauri_plugin_notification::NotificationExt;
use tracing::warn;

use crate::error::AppResult;
use crate::services::actions::ActionOutcome;

const NOTIFICATION_TITLE: &str = "ClipFlow";

/// Sink for the one-line notice that follows every user action.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

pub fn notice(result: &AppResult<ActionOutcome>) -> String {
    match result {
        Ok(outcome) => outcome.to_string(),
        Err(err) => format!("Action failed: {err}"),
    }
}

pub fn announce(notifier: &dyn Notifier, result: &AppResult<ActionOutcome>) {
    notifier.notify(&notice(result));
}

/// Posts notices as OS notifications.
pub struct DesktopNotifier<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> DesktopNotifier<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> Notifier for DesktopNotifier<R> {
    fn notify(&self, message: &str) {
        if let Err(err) = self
            .app
            .notification()
            .builder()
            .title(NOTIFICATION_TITLE)
            .body(message)
            .show()
        {
            warn!("failed to post notification: {err}");
        }
    }
}
