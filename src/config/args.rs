//! CLI argument parsing using clap

use crate::settings::{Channel, PreferenceRecord};
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

/// Launch flag written into the startup entry
pub const BACKGROUND_FLAG: &str = "-background";

/// blinkpluscharge - battery, eye-break and blink reminders
///
/// Without `-background` this is the settings console; with it, the process
/// runs the reminder engine until stopped.
#[derive(Parser, Debug)]
#[command(name = "blinkpluscharge")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Run the reminder engine only (also accepted as `-background`)
    #[arg(long)]
    pub background: bool,

    /// Settings console command
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbose output (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output to file
    #[arg(long, global = true)]
    pub log: Option<String>,

    /// Keep the console attached in background mode
    #[arg(short, long, global = true)]
    pub debug: bool,
}

/// Settings console commands
#[derive(Subcommand, Debug, Default)]
pub enum Command {
    /// Print current settings and background status
    #[default]
    Show,

    /// Change settings, save them and restart the background instance
    Set(SetArgs),

    /// Reset all settings to defaults, save and restart
    Defaults,

    /// Play a channel's reminder sound
    Preview {
        /// Channel whose sound to play
        channel: Channel,

        /// Play this file instead of the configured sound
        #[arg(long)]
        file: Option<PathBuf>,

        /// Seconds to keep the process alive while the sound plays
        #[arg(long, default_value = "3")]
        wait: u64,
    },

    /// Terminate the running background instance
    Kill,

    /// Remove the startup entry
    EndAutorun,
}

/// On/off value for a reminder or autostart
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Switch::On
    }
}

/// Field edits applied on top of the stored record
///
/// Sound options take either `system` or a path to an audio file.
#[derive(clap::Args, Debug, Default)]
pub struct SetArgs {
    /// Low battery reminder
    #[arg(long, value_name = "on|off")]
    pub battery: Option<Switch>,

    /// Battery percentage at or below which to remind
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<i32>,

    /// Seconds between battery checks
    #[arg(long, allow_negative_numbers = true)]
    pub poll: Option<i32>,

    #[arg(long, value_name = "system|PATH")]
    pub battery_sound: Option<String>,

    /// Eye break reminder
    #[arg(long = "break", value_name = "on|off")]
    pub eye_break: Option<Switch>,

    #[arg(long, allow_negative_numbers = true)]
    pub break_min: Option<i32>,

    #[arg(long, allow_negative_numbers = true)]
    pub break_sec: Option<i32>,

    #[arg(long, value_name = "system|PATH")]
    pub break_sound: Option<String>,

    /// Blink reminder
    #[arg(long, value_name = "on|off")]
    pub blink: Option<Switch>,

    #[arg(long, allow_negative_numbers = true)]
    pub blink_min: Option<i32>,

    #[arg(long, allow_negative_numbers = true)]
    pub blink_sec: Option<i32>,

    #[arg(long, value_name = "system|PATH")]
    pub blink_sound: Option<String>,

    /// Start the background instance at logon
    #[arg(long, value_name = "on|off")]
    pub autostart: Option<Switch>,
}

impl SetArgs {
    /// Apply the given edits to `record`, leaving other fields untouched
    pub fn apply(&self, record: &mut PreferenceRecord) {
        if let Some(s) = self.battery {
            record.battery.enabled = s.is_on();
        }
        if let Some(v) = self.threshold {
            record.battery.threshold_percent = v;
        }
        if let Some(v) = self.poll {
            record.battery.poll_interval_secs = v;
        }

        if let Some(s) = self.eye_break {
            record.eye_break.enabled = s.is_on();
        }
        if let Some(v) = self.break_min {
            record.eye_break.minutes = v;
        }
        if let Some(v) = self.break_sec {
            record.eye_break.seconds = v;
        }

        if let Some(s) = self.blink {
            record.blink.enabled = s.is_on();
        }
        if let Some(v) = self.blink_min {
            record.blink.minutes = v;
        }
        if let Some(v) = self.blink_sec {
            record.blink.seconds = v;
        }

        if let Some(s) = self.autostart {
            record.auto_start = s.is_on();
        }

        let sounds = [
            (Channel::Battery, &self.battery_sound),
            (Channel::Break, &self.break_sound),
            (Channel::Blink, &self.blink_sound),
        ];
        for (channel, value) in sounds {
            if let Some(value) = value {
                let sound = record.sound_mut(channel);
                if value.eq_ignore_ascii_case("system") {
                    // Keep the path around so switching back needs no retyping
                    sound.use_custom = false;
                } else {
                    sound.use_custom = true;
                    sound.custom_path = value.clone();
                }
            }
        }
    }
}

impl Args {
    /// Parse the process arguments, accepting the single-dash `-background`
    pub fn parse_from_env() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Get the log level based on verbose/quiet flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else {
            match self.verbose {
                0 => tracing::Level::INFO,
                1 => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            }
        }
    }
}

/// Rewrite `-background` to the long-flag form clap understands
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            if arg == BACKGROUND_FLAG {
                OsString::from("--background")
            } else {
                arg
            }
        })
        .collect()
}
