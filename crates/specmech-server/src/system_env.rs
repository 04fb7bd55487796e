//! Production Environment implementation using system time.
//!
//! This module provides `SystemEnv`, the production implementation of the
//! `Environment` trait that uses the runtime clock and the system wall clock.

use std::time::Duration;

use chrono::{DateTime, Utc};
use specmech_core::Environment;
use tokio::time::Instant;

/// Production environment using system time.
///
/// This implementation:
/// - Uses `tokio::time::Instant::now()` for monotonic time
/// - Uses `chrono::Utc::now()` for the controller clock
/// - Uses `tokio::time::sleep()` for actuator settle delays
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_env_time_advances() {
        let env = SystemEnv::new();

        let t1 = env.now();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = env.now();

        assert!(t2 > t1, "Time should advance");
    }

    #[test]
    fn wall_clock_is_current() {
        let env = SystemEnv::new();

        let drift = (env.wall_clock() - Utc::now()).num_seconds().abs();

        assert!(drift < 5, "wall clock should track the system clock");
    }

    #[tokio::test]
    async fn system_env_sleep_works() {
        let env = SystemEnv::new();

        let start = env.now();
        env.sleep(Duration::from_millis(50)).await;
        let elapsed = env.now() - start;

        assert!(elapsed >= Duration::from_millis(50), "Sleep should wait at least 50ms");
    }
}
