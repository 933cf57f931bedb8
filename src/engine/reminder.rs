//! Reminder engine - owns the three channel workers

use crate::engine::context::{ReminderContext, StopSignal};
use crate::engine::loops::run_channel;
use crate::error::{ReminderError, Result};
use crate::power::PowerSource;
use crate::settings::{Channel, SettingsStore};
use crate::sound::SoundNotifier;
use crossbeam_channel::{bounded, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Workers not running
    Stopped,
    /// Workers running
    Running,
    /// Waiting for workers to exit
    ShuttingDown,
}

/// Runs the battery, break and blink loops on their own threads
///
/// The loops share nothing but the settings file, which each reloads at the
/// top of every cycle, so edits apply without a restart.
pub struct ReminderEngine {
    store: SettingsStore,
    power: Arc<dyn PowerSource>,
    notifier: Arc<SoundNotifier>,
    state: EngineState,
    stop_tx: Option<Sender<()>>,
    handles: Vec<JoinHandle<()>>,
}

impl ReminderEngine {
    pub fn new(
        store: SettingsStore,
        power: Arc<dyn PowerSource>,
        notifier: Arc<SoundNotifier>,
    ) -> Self {
        Self {
            store,
            power,
            notifier,
            state: EngineState::Stopped,
            stop_tx: None,
            handles: Vec::new(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    /// Spawn one worker per channel
    pub fn start(&mut self) -> Result<()> {
        if self.state == EngineState::Running {
            return Ok(());
        }

        info!("Starting reminder engine (settings: {:?})", self.store.path());

        let (stop_tx, stop_rx) = bounded::<()>(0);
        let ctx = Arc::new(ReminderContext {
            store: self.store.clone(),
            power: self.power.clone(),
            notifier: self.notifier.clone(),
            stop: StopSignal::new(stop_rx),
        });

        self.stop_tx = Some(stop_tx);
        self.state = EngineState::Running;

        for channel in Channel::ALL {
            let worker_ctx = ctx.clone();
            let spawned = thread::Builder::new()
                .name(format!("{}-reminder", channel))
                .spawn(move || run_channel(&worker_ctx, channel));

            match spawned {
                Ok(handle) => self.handles.push(handle),
                Err(e) => {
                    warn!("Failed to start {} worker: {}", channel, e);
                    self.stop();
                    return Err(ReminderError::Spawn(e));
                }
            }
        }

        info!("Reminder engine started");
        Ok(())
    }

    /// Wake all workers, wait for them and close sound handles
    pub fn stop(&mut self) {
        if self.state != EngineState::Running {
            return;
        }
        self.state = EngineState::ShuttingDown;

        info!("Stopping reminder engine...");

        // Disconnecting the channel is the stop request
        self.stop_tx = None;

        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("Reminder worker panicked");
            }
        }

        self.notifier.close_all();

        self.state = EngineState::Stopped;
        info!("Reminder engine stopped");
    }
}

impl Drop for ReminderEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
