//! Reminder sound playback
//!
//! Every channel owns one playback handle for custom files, so previews and
//! reminders on different channels never cut each other off.

#[cfg(windows)]
mod winmm;

use crate::error::Result;
use crate::settings::Channel;
use parking_lot::Mutex;
use std::path::Path;
use tracing::{debug, warn};

/// Platform sound API
pub trait SoundBackend: Send + Sync {
    /// Play a built-in system sound without blocking
    fn play_alias(&self, alias: &str) -> Result<()>;

    /// Open `path` under `handle` and start playing it without blocking
    fn play_file(&self, handle: &str, path: &Path) -> Result<()>;

    /// Stop and release `handle`; closing an unknown handle is not an error
    fn close(&self, handle: &str);
}

/// Plays reminder sounds; failures are logged, never returned
pub struct SoundNotifier {
    backend: Box<dyn SoundBackend>,
    /// Whether each channel's custom-sound handle is open, indexed like `Channel::ALL`
    open_handles: [Mutex<bool>; 3],
}

impl SoundNotifier {
    pub fn new(backend: Box<dyn SoundBackend>) -> Self {
        Self {
            backend,
            open_handles: Default::default(),
        }
    }

    /// Open state of one channel's handle; channels never contend with each other
    fn handle_state(&self, channel: Channel) -> &Mutex<bool> {
        match channel {
            Channel::Battery => &self.open_handles[0],
            Channel::Break => &self.open_handles[1],
            Channel::Blink => &self.open_handles[2],
        }
    }

    /// Notifier backed by the platform sound API
    pub fn system() -> Self {
        #[cfg(windows)]
        {
            Self::new(Box::new(winmm::WinmmBackend))
        }
        #[cfg(not(windows))]
        {
            Self::new(Box::new(LogOnlyBackend))
        }
    }

    /// Play the channel's sound: `custom` if given, else its system alias
    pub fn play(&self, channel: Channel, custom: Option<&Path>) {
        match custom.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => {
                let handle = channel.handle_name();
                let mut open = self.handle_state(channel).lock();

                self.backend.close(&handle);
                *open = false;

                match self.backend.play_file(&handle, path) {
                    Ok(()) => {
                        debug!("Playing {} sound {:?}", channel, path);
                        *open = true;
                    }
                    Err(e) => warn!("Failed to play {} sound {:?}: {}", channel, path, e),
                }
            }
            None => {
                let alias = channel.system_alias();
                match self.backend.play_alias(alias) {
                    Ok(()) => debug!("Playing {} system sound {}", channel, alias),
                    Err(e) => warn!("Failed to play system sound {}: {}", alias, e),
                }
            }
        }
    }

    /// Channels whose custom-sound handle is currently open
    pub fn open_channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|&c| *self.handle_state(c).lock())
            .collect()
    }

    /// Close every channel's custom-sound handle
    pub fn close_all(&self) {
        for channel in Channel::ALL {
            let mut open = self.handle_state(channel).lock();
            self.backend.close(&channel.handle_name());
            *open = false;
        }
        debug!("Closed custom sound handles");
    }
}

/// Backend for hosts without a supported sound API; only logs
#[cfg(not(windows))]
pub struct LogOnlyBackend;

#[cfg(not(windows))]
impl SoundBackend for LogOnlyBackend {
    fn play_alias(&self, alias: &str) -> Result<()> {
        tracing::info!("Reminder sound: {}", alias);
        Ok(())
    }

    fn play_file(&self, handle: &str, path: &Path) -> Result<()> {
        tracing::info!("Reminder sound {:?} ({})", path, handle);
        Ok(())
    }

    fn close(&self, _handle: &str) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::ReminderError;
    use std::sync::Arc;

    /// Backend call as seen by the fake
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Alias(String),
        File(String, String),
        Close(String),
    }

    /// Records backend calls; files named `missing.wav` fail to open
    #[derive(Clone, Default)]
    pub struct RecordingBackend {
        pub calls: Arc<Mutex<Vec<Call>>>,
    }

    impl RecordingBackend {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        pub fn plays(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| !matches!(c, Call::Close(_)))
                .count()
        }
    }

    impl SoundBackend for RecordingBackend {
        fn play_alias(&self, alias: &str) -> Result<()> {
            self.calls.lock().push(Call::Alias(alias.to_string()));
            Ok(())
        }

        fn play_file(&self, handle: &str, path: &Path) -> Result<()> {
            self.calls.lock().push(Call::File(
                handle.to_string(),
                path.to_string_lossy().to_string(),
            ));
            if path.ends_with("missing.wav") {
                return Err(ReminderError::Playback("cannot open file".to_string()));
            }
            Ok(())
        }

        fn close(&self, handle: &str) {
            self.calls.lock().push(Call::Close(handle.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingBackend};
    use super::*;
    use crossbeam_channel::{bounded, Receiver, Sender};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn notifier() -> (SoundNotifier, RecordingBackend) {
        let backend = RecordingBackend::default();
        (SoundNotifier::new(Box::new(backend.clone())), backend)
    }

    #[test]
    fn test_system_alias_without_custom_file() {
        let (notifier, backend) = notifier();
        notifier.play(Channel::Blink, None);
        assert_eq!(backend.calls(), vec![Call::Alias("SystemExclamation".to_string())]);
    }

    #[test]
    fn test_empty_path_uses_alias() {
        let (notifier, backend) = notifier();
        notifier.play(Channel::Battery, Some(Path::new("")));
        assert_eq!(backend.calls(), vec![Call::Alias("SystemAsterisk".to_string())]);
    }

    #[test]
    fn test_custom_file_closes_previous_handle_first() {
        let (notifier, backend) = notifier();
        notifier.play(Channel::Break, Some(Path::new("break.wav")));

        assert_eq!(
            backend.calls(),
            vec![
                Call::Close("customSound_SystemHand".to_string()),
                Call::File("customSound_SystemHand".to_string(), "break.wav".to_string()),
            ]
        );
        assert_eq!(notifier.open_channels(), vec![Channel::Break]);
    }

    #[test]
    fn test_failed_file_is_swallowed() {
        let (notifier, backend) = notifier();
        notifier.play(Channel::Blink, Some(Path::new("missing.wav")));
        assert_eq!(backend.plays(), 1);
        assert!(notifier.open_channels().is_empty());
    }

    #[test]
    fn test_close_all_closes_every_channel() {
        let (notifier, backend) = notifier();
        notifier.play(Channel::Battery, Some(Path::new("low.wav")));
        notifier.close_all();

        let closes: Vec<_> = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Close(_)))
            .collect();
        // One close before opening, then one per channel at shutdown
        assert_eq!(closes.len(), 4);
        assert!(notifier.open_channels().is_empty());
    }

    /// Blocks inside `play_file` for `slow.wav` until the gate opens
    struct GatedBackend {
        entered: Sender<()>,
        gate: Receiver<()>,
    }

    impl SoundBackend for GatedBackend {
        fn play_alias(&self, _alias: &str) -> Result<()> {
            Ok(())
        }

        fn play_file(&self, _handle: &str, path: &Path) -> Result<()> {
            if path.ends_with("slow.wav") {
                let _ = self.entered.send(());
                let _ = self.gate.recv();
            }
            Ok(())
        }

        fn close(&self, _handle: &str) {}
    }

    #[test]
    fn test_slow_open_does_not_block_other_channels() {
        let (entered_tx, entered_rx) = bounded::<()>(1);
        let (gate_tx, gate_rx) = bounded::<()>(0);
        let notifier = Arc::new(SoundNotifier::new(Box::new(GatedBackend {
            entered: entered_tx,
            gate: gate_rx,
        })));

        let slow = {
            let notifier = notifier.clone();
            thread::spawn(move || notifier.play(Channel::Break, Some(Path::new("slow.wav"))))
        };
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let (done_tx, done_rx) = bounded::<()>(1);
        let fast = {
            let notifier = notifier.clone();
            thread::spawn(move || {
                notifier.play(Channel::Blink, Some(Path::new("fast.wav")));
                let _ = done_tx.send(());
            })
        };
        let finished = done_rx.recv_timeout(Duration::from_secs(2)).is_ok();

        gate_tx.send(()).unwrap();
        slow.join().unwrap();
        fast.join().unwrap();

        assert!(finished, "blink playback waited on the break channel");
        assert_eq!(notifier.open_channels(), vec![Channel::Break, Channel::Blink]);
    }
}
