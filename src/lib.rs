//! blinkpluscharge - battery, eye-break and blink reminders
//!
//! A background process that plays a sound when the battery runs low and at
//! fixed intervals to remind the user to rest their eyes and to blink, plus a
//! command-line settings console that edits the shared preference file.

pub mod autostart;
pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod instance;
pub mod power;
pub mod settings;
pub mod sound;

#[cfg(windows)]
mod win;

pub use error::{ReminderError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
