//! Simulated environment.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use specmech_core::Environment;
use tokio::time::Instant;

/// Turmoil-backed environment.
///
/// Turmoil drives Tokio's clock, so `now()` and `sleep()` are virtual. The
/// wall clock starts at a fixed instant and advances with virtual time,
/// which keeps every reported timestamp reproducible.
#[derive(Debug, Clone)]
pub struct SimEnv {
    base_instant: Instant,
    base_wall: DateTime<Utc>,
}

impl SimEnv {
    /// Wall clock starting at 2020-12-17T10:00:00Z.
    pub fn new() -> Self {
        let base_wall = Utc.with_ymd_and_hms(2020, 12, 17, 10, 0, 0).single().unwrap_or_default();
        Self::starting_at(base_wall)
    }

    /// Wall clock starting at `base_wall`.
    pub fn starting_at(base_wall: DateTime<Utc>) -> Self {
        Self { base_instant: Instant::now(), base_wall }
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.now() - self.base_instant).unwrap_or_default();
        self.base_wall.checked_add_signed(elapsed).unwrap_or(self.base_wall)
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
