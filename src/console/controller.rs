//! Settings console operations

use crate::autostart::StartupEntry;
use crate::error::Result;
use crate::instance::BackgroundProcess;
use crate::settings::{Channel, PreferenceRecord, SettingsStore};
use crate::sound::SoundNotifier;
use std::path::Path;
use tracing::{info, warn};

/// Edits the preference record and manages the background instance
pub struct SettingsController {
    store: SettingsStore,
    startup: Box<dyn StartupEntry>,
    background: Box<dyn BackgroundProcess>,
    notifier: SoundNotifier,
}

impl SettingsController {
    pub fn new(
        store: SettingsStore,
        startup: Box<dyn StartupEntry>,
        background: Box<dyn BackgroundProcess>,
        notifier: SoundNotifier,
    ) -> Self {
        Self {
            store,
            startup,
            background,
            notifier,
        }
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// The saved record, creating the file with defaults on first run
    pub fn current(&self) -> PreferenceRecord {
        self.store.load()
    }

    pub fn autostart_registered(&self) -> bool {
        self.startup.is_registered()
    }

    pub fn background_running(&self) -> bool {
        self.background.is_running()
    }

    /// Validate, persist, sync the startup entry and restart the background
    ///
    /// A record that fails validation is refused before anything is written.
    pub fn save(&self, record: &PreferenceRecord) -> Result<()> {
        record.validate()?;

        self.store.save(record)?;
        info!("Settings saved to {:?}", self.store.path());

        self.startup.set_auto_start(record.auto_start);
        self.restart_background();
        Ok(())
    }

    /// Save the default record
    pub fn reset_defaults(&self) -> Result<PreferenceRecord> {
        let record = PreferenceRecord::default();
        self.save(&record)?;
        Ok(record)
    }

    pub fn kill_background(&self) -> bool {
        self.background.terminate()
    }

    /// Drop the startup entry and keep it dropped on the next launch
    pub fn end_autorun(&self) -> Result<()> {
        self.startup.set_auto_start(false);

        let mut record = self.current();
        if record.auto_start {
            record.auto_start = false;
            self.store.save(&record)?;
        }
        info!("Autostart disabled");
        Ok(())
    }

    /// Play a channel's sound: `file` if given, else its saved selection
    pub fn preview(&self, channel: Channel, file: Option<&Path>) {
        match file {
            Some(path) => self.notifier.play(channel, Some(path)),
            None => {
                let record = self.current();
                self.notifier.play(channel, record.sound(channel).custom_file());
            }
        }
    }

    /// Release any sound handles opened by previews
    pub fn close_sounds(&self) {
        self.notifier.close_all();
    }

    fn restart_background(&self) {
        self.background.terminate();
        if let Err(e) = self.background.launch() {
            warn!("Failed to launch background instance: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReminderError;
    use crate::settings::ValidationError;
    use crate::sound::testing::{Call, RecordingBackend};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<String>>>);

    impl Log {
        fn push(&self, entry: impl Into<String>) {
            self.0.lock().push(entry.into());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    struct FakeStartup {
        log: Log,
        registered: Mutex<bool>,
    }

    impl StartupEntry for FakeStartup {
        fn set_auto_start(&self, enabled: bool) {
            *self.registered.lock() = enabled;
            self.log.push(format!("autostart={}", enabled));
        }

        fn is_registered(&self) -> bool {
            *self.registered.lock()
        }
    }

    struct FakeBackground {
        log: Log,
    }

    impl BackgroundProcess for FakeBackground {
        fn is_running(&self) -> bool {
            false
        }

        fn terminate(&self) -> bool {
            self.log.push("terminate");
            true
        }

        fn launch(&self) -> Result<()> {
            self.log.push("launch");
            Ok(())
        }
    }

    struct Fixture {
        _dir: TempDir,
        log: Log,
        backend: RecordingBackend,
        controller: SettingsController,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let log = Log::default();
        let backend = RecordingBackend::default();
        let controller = SettingsController::new(
            SettingsStore::new(dir.path().join("settings.bin")),
            Box::new(FakeStartup {
                log: log.clone(),
                registered: Mutex::new(false),
            }),
            Box::new(FakeBackground { log: log.clone() }),
            SoundNotifier::new(Box::new(backend.clone())),
        );

        Fixture {
            _dir: dir,
            log,
            backend,
            controller,
        }
    }

    #[test]
    fn test_save_runs_full_sequence() {
        let f = fixture();
        let mut record = PreferenceRecord::default();
        record.blink.enabled = true;

        f.controller.save(&record).unwrap();

        assert_eq!(f.controller.store().read().unwrap(), record);
        assert_eq!(f.log.entries(), vec!["autostart=true", "terminate", "launch"]);
    }

    #[test]
    fn test_threshold_out_of_range_leaves_file_untouched() {
        let f = fixture();
        let original = f.controller.current();

        let mut record = original.clone();
        record.battery.threshold_percent = 150;

        match f.controller.save(&record) {
            Err(ReminderError::Invalid(ValidationError::ThresholdOutOfRange(150))) => {}
            other => panic!("expected threshold error, got {:?}", other),
        }
        assert_eq!(f.controller.store().read().unwrap(), original);
        assert!(f.log.entries().is_empty());
    }

    #[test]
    fn test_both_intervals_zero_rejected() {
        let f = fixture();
        let mut record = PreferenceRecord::default();
        record.eye_break.minutes = 0;
        record.eye_break.seconds = 0;
        record.blink.minutes = 0;
        record.blink.seconds = 0;

        assert!(matches!(
            f.controller.save(&record),
            Err(ReminderError::Invalid(ValidationError::BothIntervalsZero))
        ));
        assert!(!f.controller.store().path().exists());
    }

    #[test]
    fn test_reset_defaults_overwrites_edits() {
        let f = fixture();
        let mut record = PreferenceRecord::default();
        record.battery.threshold_percent = 80;
        f.controller.save(&record).unwrap();

        let reset = f.controller.reset_defaults().unwrap();
        assert_eq!(reset, PreferenceRecord::default());
        assert_eq!(f.controller.current().battery.threshold_percent, 32);
    }

    #[test]
    fn test_end_autorun_persists_flag() {
        let f = fixture();
        f.controller.save(&PreferenceRecord::default()).unwrap();
        assert!(f.controller.autostart_registered());

        f.controller.end_autorun().unwrap();

        assert!(!f.controller.autostart_registered());
        assert!(!f.controller.current().auto_start);
    }

    #[test]
    fn test_preview_uses_saved_selection() {
        let f = fixture();
        let mut record = PreferenceRecord::default();
        record.blink.sound.use_custom = true;
        record.blink.sound.custom_path = "blink.wav".to_string();
        f.controller.save(&record).unwrap();

        f.controller.preview(Channel::Blink, None);
        f.controller.preview(Channel::Battery, None);

        let calls = f.backend.calls();
        assert!(calls.contains(&Call::File(
            "customSound_SystemExclamation".to_string(),
            "blink.wav".to_string()
        )));
        assert!(calls.contains(&Call::Alias("SystemAsterisk".to_string())));
    }

    #[test]
    fn test_preview_file_override() {
        let f = fixture();
        f.controller.preview(Channel::Break, Some(Path::new("other.wav")));
        assert!(f.backend.calls().contains(&Call::File(
            "customSound_SystemHand".to_string(),
            "other.wav".to_string()
        )));
    }
}
