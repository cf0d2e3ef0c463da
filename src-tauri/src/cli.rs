use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "clipflow", version, about = "Clipboard history with a local web viewer")]
pub struct Cli {
    /// Config file (default: <config dir>/clipflow/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// History database location
    #[arg(long, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Maximum number of entries kept; pinned entries are never evicted
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Loopback port for the web viewer
    #[arg(long)]
    pub port: Option<u16>,

    /// Do not start the web viewer
    #[arg(long)]
    pub no_web: bool,

    /// Run without the interactive menu until interrupted
    #[arg(long)]
    pub headless: bool,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Command-line flags win over the config file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(db) = &self.db {
            config.history.db_path = Some(db.clone());
        }
        if let Some(capacity) = self.capacity {
            config.history.capacity = capacity;
        }
        if let Some(port) = self.port {
            config.web.port = port;
        }
        if self.no_web {
            config.web.enabled = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "clipflow",
            "--db",
            "/tmp/h.db",
            "--capacity",
            "5",
            "--port",
            "18000",
            "--no-web",
        ])
        .expect("parse");

        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.history.db_path, Some(PathBuf::from("/tmp/h.db")));
        assert_eq!(config.history.capacity, 5);
        assert_eq!(config.web.port, 18_000);
        assert!(!config.web.enabled);
    }

    #[test]
    fn capacity_flag_overrides_invalid_file_value() {
        let mut config = Config::from_toml("[history]\ncapacity = 0").expect("parse");
        let cli = Cli::try_parse_from(["clipflow", "--capacity", "5"]).expect("parse");

        cli.apply(&mut config);
        config.validate().expect("valid after override");
        assert_eq!(config.history.capacity, 5);
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let cli = Cli::try_parse_from(["clipflow"]).expect("parse");
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config, Config::default());
    }
}
