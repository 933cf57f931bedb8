//! Start the background instance at logon via the HKCU Run key

use crate::config::{APP_NAME, BACKGROUND_FLAG};
use crate::error::{ReminderError, Result};
use std::path::Path;

#[cfg(windows)]
const RUN_KEY_PATH: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

/// Startup list entry for the background instance
pub trait StartupEntry: Send + Sync {
    /// Add or remove the entry; failures are logged and swallowed
    fn set_auto_start(&self, enabled: bool);

    /// Whether the entry is currently present
    fn is_registered(&self) -> bool;
}

/// Command line stored in the startup entry
pub fn launch_command(exe: &Path) -> String {
    format!("\"{}\" {}", exe.display(), BACKGROUND_FLAG)
}

/// Run-key value named after the application
#[derive(Debug, Clone)]
pub struct RunKeyEntry {
    name: String,
    command: String,
}

impl RunKeyEntry {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }

    /// Entry launching this executable in background mode
    pub fn for_current_exe() -> Result<Self> {
        let exe = std::env::current_exe().map_err(|e| ReminderError::io("current_exe", e))?;
        Ok(Self::new(APP_NAME, launch_command(&exe)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[cfg(windows)]
impl StartupEntry for RunKeyEntry {
    fn set_auto_start(&self, enabled: bool) {
        use crate::win::wide_str;
        use tracing::{info, warn};
        use windows::core::PCWSTR;
        use windows::Win32::System::Registry::{
            RegCloseKey, RegDeleteValueW, RegOpenKeyExW, RegSetValueExW, HKEY,
            HKEY_CURRENT_USER, KEY_SET_VALUE, REG_SZ,
        };

        let path = wide_str(RUN_KEY_PATH);
        let name = wide_str(&self.name);

        unsafe {
            let mut hkey = HKEY::default();
            let result = RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(path.as_ptr()),
                0,
                KEY_SET_VALUE,
                &mut hkey,
            );
            if result.is_err() {
                warn!("Failed to open Run key: {:?}", result);
                return;
            }

            if enabled {
                let value = wide_str(&self.command);
                let bytes =
                    std::slice::from_raw_parts(value.as_ptr() as *const u8, value.len() * 2);
                let result = RegSetValueExW(
                    hkey,
                    PCWSTR::from_raw(name.as_ptr()),
                    0,
                    REG_SZ,
                    Some(bytes),
                );
                if result.is_err() {
                    warn!("Failed to write startup entry: {:?}", result);
                } else {
                    info!("Startup entry set: {}", self.command);
                }
            } else {
                // Missing value is fine
                let _ = RegDeleteValueW(hkey, PCWSTR::from_raw(name.as_ptr()));
                info!("Startup entry removed");
            }

            let _ = RegCloseKey(hkey);
        }
    }

    fn is_registered(&self) -> bool {
        use crate::win::wide_str;
        use windows::core::PCWSTR;
        use windows::Win32::System::Registry::{
            RegCloseKey, RegOpenKeyExW, RegQueryValueExW, HKEY, HKEY_CURRENT_USER, KEY_READ,
        };

        let path = wide_str(RUN_KEY_PATH);
        let name = wide_str(&self.name);

        unsafe {
            let mut hkey = HKEY::default();
            let result = RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(path.as_ptr()),
                0,
                KEY_READ,
                &mut hkey,
            );
            if result.is_err() {
                return false;
            }

            let mut data_size: u32 = 0;
            let result = RegQueryValueExW(
                hkey,
                PCWSTR::from_raw(name.as_ptr()),
                None,
                None,
                None,
                Some(&mut data_size as *mut u32),
            );
            let _ = RegCloseKey(hkey);
            result.is_ok()
        }
    }
}

#[cfg(not(windows))]
impl StartupEntry for RunKeyEntry {
    fn set_auto_start(&self, enabled: bool) {
        tracing::debug!(
            "No startup list on this platform, ignoring autostart={} for {}",
            enabled,
            self.name
        );
    }

    fn is_registered(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_launch_command_quotes_path() {
        let exe = PathBuf::from("C:\\Program Files\\BlinkPlusCharge\\blinkpluscharge.exe");
        assert_eq!(
            launch_command(&exe),
            "\"C:\\Program Files\\BlinkPlusCharge\\blinkpluscharge.exe\" -background"
        );
    }

    #[test]
    fn test_entry_for_current_exe() {
        let entry = RunKeyEntry::for_current_exe().unwrap();
        assert_eq!(entry.name(), "BlinkPlusCharge");
        assert!(entry.command().ends_with("\" -background"));
    }
}
