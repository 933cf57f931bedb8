//! Per-channel polling loops

use crate::engine::context::ReminderContext;
use crate::power::PowerSource;
use crate::settings::{BatteryReminder, Channel, IntervalReminder};
use std::time::Duration;
use tracing::{debug, info};

/// Re-check period while a channel is idle
pub const IDLE_TICK: Duration = Duration::from_millis(100);

/// Outcome of one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    /// Play the channel's sound now
    pub fire: bool,
    /// How long to wait before the next iteration
    pub wait: Duration,
}

impl Cycle {
    fn idle() -> Self {
        Self {
            fire: false,
            wait: IDLE_TICK,
        }
    }
}

/// Battery check: level-triggered, fires every poll while on battery and low
pub fn battery_cycle(reminder: &BatteryReminder, power: &dyn PowerSource) -> Cycle {
    let fire = reminder.enabled && {
        let status = power.status();
        status.on_battery() && status.at_or_below(reminder.threshold_percent)
    };

    let wait = if reminder.poll_interval_secs > 0 {
        Duration::from_secs(reminder.poll_interval_secs as u64)
    } else {
        IDLE_TICK
    };

    Cycle { fire, wait }
}

/// Break/blink: fire at the start of each interval, then sleep through it
pub fn interval_cycle(reminder: &IntervalReminder) -> Cycle {
    let interval_ms = reminder.interval_ms();
    if reminder.enabled && interval_ms > 0 {
        Cycle {
            fire: true,
            wait: Duration::from_millis(interval_ms as u64),
        }
    } else {
        Cycle::idle()
    }
}

/// Worker body for one channel; returns only when stop is requested
pub fn run_channel(ctx: &ReminderContext, channel: Channel) {
    info!("{} reminder loop started", channel);

    while !ctx.stop.is_stopped() {
        let record = ctx.snapshot();

        let cycle = match channel {
            Channel::Battery => battery_cycle(&record.battery, &*ctx.power),
            Channel::Break => interval_cycle(&record.eye_break),
            Channel::Blink => interval_cycle(&record.blink),
        };

        if cycle.fire {
            debug!("{} reminder firing", channel);
            ctx.notifier.play(channel, record.sound(channel).custom_file());
        }

        if ctx.stop.wait(cycle.wait) {
            break;
        }
    }

    info!("{} reminder loop stopped", channel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power::{AcLine, PowerStatus};

    struct FixedPower(PowerStatus);

    impl PowerSource for FixedPower {
        fn status(&self) -> PowerStatus {
            self.0
        }
    }

    fn on_battery(percent: u8) -> FixedPower {
        FixedPower(PowerStatus {
            ac_line: AcLine::Offline,
            battery_percent: Some(percent),
        })
    }

    fn battery(enabled: bool) -> BatteryReminder {
        BatteryReminder {
            enabled,
            threshold_percent: 32,
            poll_interval_secs: 61,
            ..Default::default()
        }
    }

    fn interval(enabled: bool, minutes: i32, seconds: i32) -> IntervalReminder {
        IntervalReminder {
            enabled,
            minutes,
            seconds,
            ..Default::default()
        }
    }

    #[test]
    fn test_battery_fires_below_threshold_on_battery() {
        let cycle = battery_cycle(&battery(true), &on_battery(30));
        assert!(cycle.fire);
        assert_eq!(cycle.wait, Duration::from_secs(61));
    }

    #[test]
    fn test_battery_quiet_above_threshold() {
        assert!(!battery_cycle(&battery(true), &on_battery(50)).fire);
    }

    #[test]
    fn test_battery_never_fires_on_ac() {
        for percent in [0u8, 10, 30, 32] {
            let power = FixedPower(PowerStatus {
                ac_line: AcLine::Online,
                battery_percent: Some(percent),
            });
            assert!(!battery_cycle(&battery(true), &power).fire);
        }
    }

    #[test]
    fn test_battery_disabled_never_fires() {
        assert!(!battery_cycle(&battery(false), &on_battery(5)).fire);
    }

    #[test]
    fn test_battery_zero_poll_waits_a_tick() {
        let mut reminder = battery(true);
        reminder.poll_interval_secs = 0;
        assert_eq!(battery_cycle(&reminder, &on_battery(90)).wait, IDLE_TICK);
    }

    #[test]
    fn test_interval_fires_then_sleeps_full_interval() {
        let cycle = interval_cycle(&interval(true, 1, 30));
        assert!(cycle.fire);
        assert_eq!(cycle.wait, Duration::from_millis(90_000));
    }

    #[test]
    fn test_zero_interval_idles() {
        assert_eq!(interval_cycle(&interval(true, 0, 0)), Cycle::idle());
    }

    #[test]
    fn test_negative_interval_idles() {
        assert_eq!(interval_cycle(&interval(true, 0, -5)), Cycle::idle());
    }

    #[test]
    fn test_disabled_interval_idles() {
        assert_eq!(interval_cycle(&interval(false, 0, 12)), Cycle::idle());
    }
}
