//! Unified error types for blinkpluscharge

use crate::settings::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for reminder operations
#[derive(Error, Debug)]
pub enum ReminderError {
    /// File system error with the path that caused it
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file exists but does not hold a valid record
    #[error("Settings record is malformed: {0}")]
    MalformedRecord(String),

    /// Settings rejected before saving
    #[error("Invalid settings: {0}")]
    Invalid(#[from] ValidationError),

    /// Configuration file could not be parsed
    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Another background instance holds the lock
    #[error("Background instance already running (pid {0})")]
    AlreadyRunning(u32),

    /// Worker thread could not be started
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// Sound playback failed
    #[error("Sound playback failed: {0}")]
    Playback(String),

    /// Windows API call failed
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    Platform(#[from] windows::core::Error),
}

/// Result type alias for reminder operations
pub type Result<T> = std::result::Result<T, ReminderError>;

impl ReminderError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the settings file simply does not exist yet
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ReminderError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
