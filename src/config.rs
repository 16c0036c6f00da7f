//! Application Configuration
//!
//! JSON config file; every field has a default so a partial (or missing)
//! file works.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "COUNTER_BOARD_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name used for the log file
    pub app_name: String,
    /// SQLite database file (":memory:" for a throwaway board)
    pub db_path: PathBuf,
    /// Directory of the rolling log
    pub log_dir: PathBuf,
    /// Lines kept by the rolling log
    pub log_capacity: usize,
    /// trace | debug | info | warn | error
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "CounterBoard".to_string(),
            db_path: PathBuf::from("counter_board.db"),
            log_dir: PathBuf::from("logs"),
            log_capacity: rolling_logger::DEFAULT_CAPACITY,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the file named by `COUNTER_BOARD_CONFIG`, or defaults
    pub fn load() -> Result<Self, String> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Invalid config {}: {}", path.display(), e))
    }

    /// Parsed log level; unknown names fall back to INFO
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(self.log_level.trim()).unwrap_or(tracing::Level::INFO)
    }
}
