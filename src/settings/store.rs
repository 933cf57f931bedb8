//! Settings file persistence

use crate::error::{ReminderError, Result};
use crate::settings::codec;
use crate::settings::record::PreferenceRecord;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Settings file name inside the data directory
pub const SETTINGS_FILE: &str = "settings.bin";

/// Reads and writes the preference record at a fixed path
///
/// The file is shared between the foreground instance (writer) and the
/// background instance (reader) without locking. Saves go through a temp
/// file and a rename so readers only ever see a whole record.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data dir>/settings.bin`
    pub fn at_default_location() -> Self {
        Self::new(crate::config::data_dir().join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record as it is on disk, without falling back to defaults
    pub fn read(&self) -> Result<PreferenceRecord> {
        let bytes = fs::read(&self.path).map_err(|e| ReminderError::io(&self.path, e))?;
        codec::decode(&bytes)
    }

    /// Load settings, writing the defaults if the file is missing or unreadable
    pub fn load(&self) -> PreferenceRecord {
        match self.read() {
            Ok(record) => {
                debug!("Loaded settings from {:?}", self.path);
                record
            }
            Err(e) => {
                if e.is_not_found() {
                    info!("Settings file not found, creating defaults");
                } else {
                    warn!("Failed to read settings file: {}", e);
                }

                let defaults = PreferenceRecord::default();
                if let Err(e) = self.save(&defaults) {
                    warn!("Failed to write default settings: {}", e);
                }
                defaults
            }
        }
    }

    /// Replace the settings file with `record`
    pub fn save(&self, record: &PreferenceRecord) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Ensure directory exists
        fs::create_dir_all(dir).map_err(|e| ReminderError::io(dir, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ReminderError::io(dir, e))?;
        tmp.write_all(&codec::encode(record))
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| ReminderError::io(tmp.path(), e))?;

        tmp.persist(&self.path)
            .map_err(|e| ReminderError::io(&self.path, e.error))?;

        info!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::codec::RECORD_LEN;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("BlinkPlusCharge").join(SETTINGS_FILE))
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let record = store.load();
        assert_eq!(record, PreferenceRecord::default());

        let bytes = fs::read(store.path()).unwrap();
        assert_eq!(bytes, codec::encode(&PreferenceRecord::default()));
    }

    #[test]
    fn test_load_save_load_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let first = store.load();
        store.save(&first).unwrap();
        let second = store.load();
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_then_read() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut record = PreferenceRecord::default();
        record.battery.enabled = true;
        record.battery.threshold_percent = 20;
        store.save(&record).unwrap();

        assert_eq!(store.read().unwrap(), record);
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = store_in(&dir).read().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_truncated_file_replaced_with_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut record = PreferenceRecord::default();
        record.blink.enabled = true;
        let bytes = codec::encode(&record);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), &bytes[..100]).unwrap();

        assert!(store.read().is_err());
        assert_eq!(store.load(), PreferenceRecord::default());
        assert_eq!(fs::read(store.path()).unwrap().len(), RECORD_LEN);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&PreferenceRecord::default()).unwrap();
        store.save(&PreferenceRecord::default()).unwrap();

        let entries = fs::read_dir(store.path().parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_default_location_is_in_data_dir() {
        let store = SettingsStore::at_default_location();
        assert_eq!(store.path(), crate::config::data_dir().join(SETTINGS_FILE));
    }
}
