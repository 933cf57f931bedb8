//! Preference record, its binary layout and the settings file store

pub mod codec;
mod record;
mod store;

pub use record::{
    BatteryReminder, Channel, IntervalReminder, PreferenceRecord, SoundChoice, ValidationError,
};
pub use store::{SettingsStore, SETTINGS_FILE};
