//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples the emulator from system time. Actuator
//! settle delays and the controller clock both go through it, which lets the
//! same dispatch code run against:
//!
//! - Production: real monotonic time and the system wall clock.
//! - Simulation: Turmoil's virtual clock, where a five second door settle
//!   costs nothing and timestamps are reproducible.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Consistency: `wall_clock()` advances with `now()`
//! - Isolation: Implementations must not share global state

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Abstract environment providing time and async sleeping.
///
/// `now()` returns a Tokio instant so that paused or simulated runtimes
/// control it.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current monotonic time.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: Subsequent calls must return times >= previous calls.
    fn now(&self) -> Instant;

    /// Returns the current UTC wall-clock time.
    ///
    /// The controller clock reports this plus the operator-set offset.
    fn wall_clock(&self) -> DateTime<Utc>;

    /// Sleeps for the specified duration.
    ///
    /// Used for actuator settle delays and the wait verb.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
