//! Optional logging configuration file

use crate::error::{ReminderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Application configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log file path (empty = no file logging)
    pub log_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: String::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ReminderError::io(path, e))?;

        toml::from_str(&content).map_err(|source| ReminderError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `<data dir>/config.toml`, or defaults if it does not exist
    pub fn load_default() -> Result<Self> {
        Self::load_from_dir(&crate::config::data_dir())
    }

    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Configured log file, if any
    pub fn log_file_path(&self) -> Option<PathBuf> {
        if self.log_file.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.log_file))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.log_file_path().is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "log_file = \"bg.log\"\n").unwrap();

        let config = AppConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_file_path(), Some(PathBuf::from("bg.log")));
    }

    #[test]
    fn test_bad_toml_reports_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "log_level = [").unwrap();

        let err = AppConfig::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ReminderError::ConfigParse { .. }));
    }
}
