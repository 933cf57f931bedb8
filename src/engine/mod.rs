//! Background reminder engine

mod context;
mod loops;
mod reminder;

pub use context::{ReminderContext, StopSignal};
pub use loops::{battery_cycle, interval_cycle, run_channel, Cycle, IDLE_TICK};
pub use reminder::{EngineState, ReminderEngine};
