//! Operator-settable controller clock.
//!
//! The controller has no battery-backed clock. It keeps an offset against
//! wall time that `st` sets and a reboot clears:
//!
//! ```text
//! reported = wall + offset
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClockState {
    offset: TimeDelta,
    last_set: DateTime<Utc>,
}

/// Controller clock.
#[derive(Debug)]
pub struct Clock {
    boot: DateTime<Utc>,
    state: watch::Sender<ClockState>,
}

impl Clock {
    /// Create a clock that booted at `boot` with no offset.
    pub fn new(boot: DateTime<Utc>) -> Self {
        let (state, _) = watch::channel(ClockState { offset: TimeDelta::zero(), last_set: boot });
        Self { boot, state }
    }

    /// Boot timestamp.
    pub fn boot_time(&self) -> DateTime<Utc> {
        self.boot
    }

    /// Current offset against wall time.
    pub fn offset(&self) -> TimeDelta {
        self.state.borrow().offset
    }

    /// Controller time the clock was last set to (boot time if never).
    pub fn last_set(&self) -> DateTime<Utc> {
        self.state.borrow().last_set
    }

    /// Controller time for a given wall time.
    pub fn now(&self, wall: DateTime<Utc>) -> DateTime<Utc> {
        wall.checked_add_signed(self.offset()).unwrap_or(wall)
    }

    /// Make the controller read `target` at wall time `wall`.
    pub fn set(&self, wall: DateTime<Utc>, target: DateTime<Utc>) {
        let offset = target.signed_duration_since(wall);
        self.state.send_replace(ClockState { offset, last_set: target });
        tracing::debug!(offset_seconds = offset.num_seconds(), "clock set");
    }

    /// Drop the offset and forget the last set time. Called on reboot.
    pub fn reset_offset(&self) {
        self.state.send_replace(ClockState { offset: TimeDelta::zero(), last_set: self.boot });
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 12, 17, h, m, s).single().expect("valid time")
    }

    #[test]
    fn new_clock_follows_wall_time() {
        let clock = Clock::new(at(8, 0, 0));

        assert_eq!(clock.now(at(9, 30, 0)), at(9, 30, 0));
        assert_eq!(clock.last_set(), at(8, 0, 0));
    }

    #[test]
    fn set_applies_offset_to_later_readings() {
        let clock = Clock::new(at(8, 0, 0));

        clock.set(at(9, 0, 0), at(12, 0, 0));

        assert_eq!(clock.offset(), TimeDelta::hours(3));
        assert_eq!(clock.now(at(9, 0, 10)), at(12, 0, 10));
        assert_eq!(clock.last_set(), at(12, 0, 0));
    }

    #[test]
    fn reset_keeps_boot_time() {
        let clock = Clock::new(at(8, 0, 0));
        clock.set(at(9, 0, 0), at(7, 0, 0));

        clock.reset_offset();

        assert_eq!(clock.offset(), TimeDelta::zero());
        assert_eq!(clock.boot_time(), at(8, 0, 0));
        assert_eq!(clock.last_set(), at(8, 0, 0));
    }
}
