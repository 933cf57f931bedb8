//! Shared state handed to each reminder worker

use crate::power::PowerSource;
use crate::settings::{PreferenceRecord, SettingsStore};
use crate::sound::SoundNotifier;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Stop request observed by the workers
///
/// Nothing is ever sent on the channel: dropping the engine's sender
/// disconnects it, which wakes every waiting worker at once.
#[derive(Clone)]
pub struct StopSignal {
    rx: Receiver<()>,
}

impl StopSignal {
    pub fn new(rx: Receiver<()>) -> Self {
        Self { rx }
    }

    pub fn is_stopped(&self) -> bool {
        !matches!(self.rx.try_recv(), Err(TryRecvError::Empty))
    }

    /// Sleep up to `timeout`; returns true if stop was requested meanwhile
    pub fn wait(&self, timeout: Duration) -> bool {
        !matches!(self.rx.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
    }
}

/// Everything a reminder loop needs, passed explicitly instead of globals
pub struct ReminderContext {
    pub store: SettingsStore,
    pub power: Arc<dyn PowerSource>,
    pub notifier: Arc<SoundNotifier>,
    pub stop: StopSignal,
}

impl ReminderContext {
    /// Settings for one cycle; an unreadable file counts as all reminders off
    pub fn snapshot(&self) -> PreferenceRecord {
        match self.store.read() {
            Ok(record) => record,
            Err(e) => {
                trace!("Settings unreadable this cycle: {}", e);
                PreferenceRecord::zeroed()
            }
        }
    }
}
