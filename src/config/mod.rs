//! Command line arguments, logging config and per-user paths

mod app;
mod args;

pub use app::{AppConfig, CONFIG_FILE};
pub use args::{normalize_args, Args, Command, SetArgs, Switch, BACKGROUND_FLAG};

use std::path::PathBuf;

/// Application name used for the data directory and the startup entry
pub const APP_NAME: &str = "BlinkPlusCharge";

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "BLINKPLUSCHARGE_DATA_DIR";

/// Per-user data directory (e.g., %APPDATA%\BlinkPlusCharge)
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}
