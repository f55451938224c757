use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file. Created (with parent directories) if missing.
    pub database: PathBuf,
    pub host: String,
    pub port: u16,
    /// Directory for daily-rotated log files; stdout when unset.
    pub log_dir: Option<PathBuf>,
    /// Request timeout applied to the whole API router, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("database/courseforge.db"),
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_dir: None,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Environment overrides, applied after the file. `COURSEFORGE_DATABASE`
    /// is the only one deployments have needed so far.
    pub fn apply_env(mut self) -> Self {
        if let Ok(database) = dotenvy::var("COURSEFORGE_DATABASE") {
            self.database = PathBuf::from(database);
        }
        self
    }
}
