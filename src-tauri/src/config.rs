use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DEFAULT_CAPACITY;

const APP_DIR: &str = "clipflow";
const LEGACY_DATA_DIR: &str = ".clipflow";
const MIN_POLL_INTERVAL_MS: u64 = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("no home or config directory available")]
    NoHomeDir,
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Configuration for ClipFlow, read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub menu: MenuConfig,
    #[serde(default)]
    pub login: LoginConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of entries kept; pinned entries are never evicted
    pub capacity: usize,
    /// Database location (None = ~/.clipflow/history.db)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub poll_interval_ms: u64,
    /// Upper bound on a single clipboard read
    pub read_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub enabled: bool,
    /// Loopback port for the history viewer
    pub port: u16,
    /// Entries returned by /api/clips
    pub list_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    pub recent_items: usize,
    pub preview_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Enable start on login at launch when it is not already enabled
    pub register_on_launch: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            db_path: None,
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            read_timeout_ms: 1_000,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 17_890,
            list_limit: 50,
        }
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            recent_items: 8,
            preview_length: 40,
        }
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            register_on_launch: true,
        }
    }
}

impl WatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoHomeDir)?;
        path.push(APP_DIR);
        path.push("config.toml");
        Ok(path)
    }

    /// Load configuration from file, or write the defaults there if it does
    /// not exist yet.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)?;
            let config = Self::from_toml(&contents)?;
            return Ok(config);
        }

        let config = Config::default();
        config.save(&config_path)?;
        Ok(config)
    }

    /// Parses a config file. Values are checked by `validate` once command
    /// line overrides have been applied.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.capacity == 0 {
            return Err(ConfigError::Invalid(
                "history.capacity must be at least 1".to_string(),
            ));
        }
        if self.watcher.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "watcher.poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}"
            )));
        }
        if self.watcher.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "watcher.read_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.history.db_path {
            return Ok(path.clone());
        }
        let mut path = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        path.push(LEGACY_DATA_DIR);
        path.push("history.db");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use uuid::Uuid;

    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.history.capacity, 100);
        assert_eq!(config.watcher.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.web.port, 17_890);
        assert_eq!(config.menu.preview_length, 40);
        assert!(config.login.register_on_launch);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config = Config::from_toml(
            r#"
            [history]
            capacity = 25

            [web]
            enabled = false
            "#,
        )
        .expect("parse");

        assert_eq!(config.history.capacity, 25);
        assert!(!config.web.enabled);
        assert_eq!(config.web.port, 17_890);
        assert_eq!(config.menu.recent_items, 8);
    }

    #[test]
    fn rejects_zero_capacity_and_tight_polling() {
        let empty = Config::from_toml("[history]\ncapacity = 0").expect("parse");
        assert!(matches!(empty.validate(), Err(ConfigError::Invalid(_))));

        let busy = Config::from_toml("[watcher]\npoll_interval_ms = 10").expect("parse");
        assert!(matches!(busy.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            Config::from_toml("[history\ncapacity = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_creates_default_file() {
        let path = env::temp_dir()
            .join(format!("clipflow-config-{}", Uuid::new_v4()))
            .join("config.toml");

        let created = Config::load(Some(path.clone())).expect("load");
        assert!(path.exists());
        assert_eq!(created, Config::default());

        let reloaded = Config::load(Some(path.clone())).expect("reload");
        assert_eq!(reloaded, created);

        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn explicit_db_path_wins() {
        let mut config = Config::default();
        config.history.db_path = Some(PathBuf::from("/tmp/clips.db"));
        assert_eq!(config.db_path().expect("path"), PathBuf::from("/tmp/clips.db"));
    }
}
