//! Preference record and save-time validation

use crate::settings::codec::MAX_PATH_UNITS;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Reminder channels, each with its own sound and playback handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Battery,
    Break,
    Blink,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Battery, Channel::Break, Channel::Blink];

    /// Built-in system sound played when no custom file is configured
    pub fn system_alias(self) -> &'static str {
        match self {
            Channel::Battery => "SystemAsterisk",
            Channel::Break => "SystemHand",
            Channel::Blink => "SystemExclamation",
        }
    }

    /// Playback handle owned by this channel for custom files
    pub fn handle_name(self) -> String {
        format!("customSound_{}", self.system_alias())
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Battery => "battery",
            Channel::Break => "break",
            Channel::Blink => "blink",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Sound selection for one channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SoundChoice {
    /// Play `custom_path` instead of the system alias
    pub use_custom: bool,
    /// Audio file path, kept even while the system sound is selected
    pub custom_path: String,
}

impl SoundChoice {
    /// The file to play, if a non-empty custom sound is selected
    pub fn custom_file(&self) -> Option<&Path> {
        if self.use_custom && !self.custom_path.is_empty() {
            Some(Path::new(&self.custom_path))
        } else {
            None
        }
    }
}

/// Low battery reminder settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatteryReminder {
    pub enabled: bool,
    /// Fire at or below this charge percentage
    pub threshold_percent: i32,
    /// Seconds between battery checks
    pub poll_interval_secs: i32,
    pub sound: SoundChoice,
}

/// Break or blink reminder settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntervalReminder {
    pub enabled: bool,
    pub minutes: i32,
    pub seconds: i32,
    pub sound: SoundChoice,
}

impl IntervalReminder {
    /// Combined interval in milliseconds; may be zero or negative on a bad record
    pub fn interval_ms(&self) -> i64 {
        i64::from(self.minutes) * 60_000 + i64::from(self.seconds) * 1_000
    }
}

/// The persisted preference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferenceRecord {
    pub battery: BatteryReminder,
    #[serde(rename = "break")]
    pub eye_break: IntervalReminder,
    pub blink: IntervalReminder,
    pub auto_start: bool,
}

impl Default for PreferenceRecord {
    fn default() -> Self {
        Self {
            battery: BatteryReminder {
                enabled: false,
                threshold_percent: 32,
                poll_interval_secs: 61,
                sound: SoundChoice::default(),
            },
            eye_break: IntervalReminder {
                enabled: false,
                minutes: 15,
                seconds: 0,
                sound: SoundChoice::default(),
            },
            blink: IntervalReminder {
                enabled: false,
                minutes: 0,
                seconds: 12,
                sound: SoundChoice::default(),
            },
            auto_start: true,
        }
    }
}

/// Reasons a record is refused at save time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("battery percentage must be 0-100, got {0}")]
    ThresholdOutOfRange(i32),

    #[error("battery check interval must be at least 1s, got {0}s")]
    PollIntervalTooShort(i32),

    #[error("{0} interval must be non-negative")]
    NegativeInterval(Channel),

    #[error("break and blink intervals cannot both be 0")]
    BothIntervalsZero,

    #[error("{0} sound path is longer than 259 characters")]
    SoundPathTooLong(Channel),
}

impl PreferenceRecord {
    /// A record with every field zeroed, used when a cycle cannot read the file
    pub fn zeroed() -> Self {
        Self {
            battery: BatteryReminder::default(),
            eye_break: IntervalReminder::default(),
            blink: IntervalReminder::default(),
            auto_start: false,
        }
    }

    pub fn interval(&self, channel: Channel) -> Option<&IntervalReminder> {
        match channel {
            Channel::Battery => None,
            Channel::Break => Some(&self.eye_break),
            Channel::Blink => Some(&self.blink),
        }
    }

    pub fn sound(&self, channel: Channel) -> &SoundChoice {
        match channel {
            Channel::Battery => &self.battery.sound,
            Channel::Break => &self.eye_break.sound,
            Channel::Blink => &self.blink.sound,
        }
    }

    pub fn sound_mut(&mut self, channel: Channel) -> &mut SoundChoice {
        match channel {
            Channel::Battery => &mut self.battery.sound,
            Channel::Break => &mut self.eye_break.sound,
            Channel::Blink => &mut self.blink.sound,
        }
    }

    /// Check the ranges the settings console enforces before writing
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let battery = &self.battery;
        if !(0..=100).contains(&battery.threshold_percent) {
            return Err(ValidationError::ThresholdOutOfRange(battery.threshold_percent));
        }
        if battery.poll_interval_secs < 1 {
            return Err(ValidationError::PollIntervalTooShort(battery.poll_interval_secs));
        }

        for channel in [Channel::Break, Channel::Blink] {
            if let Some(reminder) = self.interval(channel) {
                if reminder.minutes < 0 || reminder.seconds < 0 {
                    return Err(ValidationError::NegativeInterval(channel));
                }
            }
        }

        if self.eye_break.interval_ms() == 0 && self.blink.interval_ms() == 0 {
            return Err(ValidationError::BothIntervalsZero);
        }

        for channel in Channel::ALL {
            if self.sound(channel).custom_path.encode_utf16().count() > MAX_PATH_UNITS {
                return Err(ValidationError::SoundPathTooLong(channel));
            }
        }

        Ok(())
    }
}
