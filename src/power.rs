//! AC line and battery charge readings

/// AC line state as reported by the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcLine {
    Online,
    Offline,
    Unknown,
}

/// One reading of the power state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerStatus {
    pub ac_line: AcLine,
    /// Remaining charge, `None` when unknown or no battery is present
    pub battery_percent: Option<u8>,
}

impl PowerStatus {
    pub fn unknown() -> Self {
        Self {
            ac_line: AcLine::Unknown,
            battery_percent: None,
        }
    }

    /// Running on battery power, not on AC
    pub fn on_battery(&self) -> bool {
        self.ac_line == AcLine::Offline
    }

    /// Charge is known and at or below `threshold`
    pub fn at_or_below(&self, threshold: i32) -> bool {
        self.battery_percent
            .map(|p| i32::from(p) <= threshold)
            .unwrap_or(false)
    }
}

/// Source of power readings
pub trait PowerSource: Send + Sync {
    fn status(&self) -> PowerStatus;
}

/// Power source for the current platform
pub fn system_power() -> Box<dyn PowerSource> {
    #[cfg(windows)]
    {
        Box::new(windows_power::SystemPower)
    }
    #[cfg(not(windows))]
    {
        Box::new(UnsupportedPower)
    }
}

/// Reports an unknown power state, so battery reminders never fire
#[cfg(not(windows))]
pub struct UnsupportedPower;

#[cfg(not(windows))]
impl PowerSource for UnsupportedPower {
    fn status(&self) -> PowerStatus {
        PowerStatus::unknown()
    }
}

#[cfg(windows)]
mod windows_power {
    use super::{AcLine, PowerSource, PowerStatus};
    use tracing::debug;
    use windows::Win32::System::Power::{GetSystemPowerStatus, SYSTEM_POWER_STATUS};

    /// Battery percent value meaning "unknown"
    const PERCENT_UNKNOWN: u8 = 255;

    pub struct SystemPower;

    impl PowerSource for SystemPower {
        fn status(&self) -> PowerStatus {
            let mut raw = SYSTEM_POWER_STATUS::default();
            if let Err(e) = unsafe { GetSystemPowerStatus(&mut raw) } {
                debug!("GetSystemPowerStatus failed: {}", e);
                return PowerStatus::unknown();
            }

            let ac_line = match raw.ACLineStatus {
                0 => AcLine::Offline,
                1 => AcLine::Online,
                _ => AcLine::Unknown,
            };
            let battery_percent = match raw.BatteryLifePercent {
                PERCENT_UNKNOWN => None,
                p => Some(p),
            };

            PowerStatus {
                ac_line,
                battery_percent,
            }
        }
    }
}
