use tauri::{AppHandle, Runtime};
use tauri_plugin_autostart::ManagerExt as AutostartManagerExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoginItemError {
    #[error("autostart failed: {0}")]
    Autostart(String),
    #[error("start on login is managed by the menu bar app")]
    Unsupported,
}

/// Start-on-login registration, kept behind a trait so nothing in the core
/// has to drive real OS automation.
pub trait LoginItemRegistrar: Send + Sync {
    fn is_enabled(&self) -> Result<bool, LoginItemError>;
    fn enable(&self) -> Result<(), LoginItemError>;
    fn disable(&self) -> Result<(), LoginItemError>;
}

/// Login item backed by the autostart plugin (a LaunchAgent on macOS).
pub struct AutostartLoginItems<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> AutostartLoginItems<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

fn autostart_error(err: impl std::fmt::Display) -> LoginItemError {
    LoginItemError::Autostart(err.to_string())
}

impl<R: Runtime> LoginItemRegistrar for AutostartLoginItems<R> {
    fn is_enabled(&self) -> Result<bool, LoginItemError> {
        self.app.autolaunch().is_enabled().map_err(autostart_error)
    }

    fn enable(&self) -> Result<(), LoginItemError> {
        self.app.autolaunch().enable().map_err(autostart_error)
    }

    fn disable(&self) -> Result<(), LoginItemError> {
        self.app.autolaunch().disable().map_err(autostart_error)
    }
}

/// Used when running without the tray app, where there is no autostart
/// plugin to drive.
pub struct UnsupportedLoginItems;

impl LoginItemRegistrar for UnsupportedLoginItems {
    fn is_enabled(&self) -> Result<bool, LoginItemError> {
        Ok(false)
    }

    fn enable(&self) -> Result<(), LoginItemError> {
        Err(LoginItemError::Unsupported)
    }

    fn disable(&self) -> Result<(), LoginItemError> {
        Err(LoginItemError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_registrar_reports_disabled() {
        let registrar = UnsupportedLoginItems;
        assert!(!registrar.is_enabled().expect("query"));
        assert!(matches!(registrar.enable(), Err(LoginItemError::Unsupported)));
        assert!(matches!(registrar.disable(), Err(LoginItemError::Unsupported)));
    }

    #[test]
    fn autostart_errors_keep_their_message() {
        let err = autostart_error("launch agent not writable");
        assert_eq!(err.to_string(), "autostart failed: launch agent not writable");
    }
}
