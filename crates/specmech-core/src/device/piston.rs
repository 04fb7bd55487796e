//! Collimator pistons.
//!
//! A piston holds an encoder position. Moves are absolute, relative, or home
//! (absolute zero). The new position is applied once the settle delay has
//! elapsed; until then reports show where the piston started. Positions are
//! not bounded unless the deployment configures limits.

use std::time::Duration;

use specmech_proto::PistonId;
use tokio::sync::{Mutex, watch};

use super::Motion;
use crate::{
    config::{PistonLimits, PistonTiming},
    env::Environment,
};

/// Kind of piston move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PistonMove {
    /// Go to a position.
    Absolute(i64),
    /// Go by a signed delta from the current position.
    Relative(i64),
    /// Go to zero.
    Home,
}

impl PistonMove {
    /// Target reached from `current`. Relative moves saturate at the
    /// integer range.
    pub fn target(self, current: i64) -> i64 {
        match self {
            Self::Absolute(position) => position,
            Self::Relative(delta) => current.saturating_add(delta),
            Self::Home => 0,
        }
    }
}

/// Observable state of a piston.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PistonStatus {
    /// Encoder position.
    pub position: i64,
    /// A move is in progress.
    pub moving: bool,
    /// Latest move, if any.
    pub last_motion: Option<Motion>,
}

/// Motion rules shared by every piston in a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drive {
    /// Settle delay rule.
    pub timing: PistonTiming,
    /// Optional clamp range.
    pub limits: Option<PistonLimits>,
}

impl Drive {
    fn plan(&self, current: i64, request: PistonMove) -> (i64, Duration) {
        let target = request.target(current);
        let target = self.limits.map_or(target, |limits| limits.clamp(target));
        (target, self.timing.delay(target.abs_diff(current)))
    }
}

/// One piston.
#[derive(Debug)]
pub struct Piston {
    id: PistonId,
    status: watch::Sender<PistonStatus>,
    motion_lock: Mutex<()>,
}

impl Piston {
    /// Create a piston at rest.
    pub fn new(id: PistonId, position: i64) -> Self {
        let (status, _) =
            watch::channel(PistonStatus { position, moving: false, last_motion: None });
        Self { id, status, motion_lock: Mutex::new(()) }
    }

    /// Which piston this is.
    pub fn id(&self) -> PistonId {
        self.id
    }

    /// Current encoder position.
    pub fn position(&self) -> i64 {
        self.status.borrow().position
    }

    /// Position and motion state.
    pub fn status(&self) -> PistonStatus {
        *self.status.borrow()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<PistonStatus> {
        self.status.subscribe()
    }

    /// Move and wait for the piston to settle. Returns the final position.
    pub async fn drive<E: Environment>(&self, env: &E, drive: &Drive, request: PistonMove) -> i64 {
        let _guard = self.motion_lock.lock().await;

        let current = self.position();
        let (target, delay) = drive.plan(current, request);
        let started_at = env.now();

        self.status.send_replace(PistonStatus {
            position: current,
            moving: true,
            last_motion: Some(Motion { started_at, settled_at: None }),
        });
        tracing::debug!(piston = ?self.id, from = current, to = target, ?delay, "piston moving");

        if !delay.is_zero() {
            env.sleep(delay).await;
        }

        let settled_at = env.now();
        self.status.send_replace(PistonStatus {
            position: target,
            moving: false,
            last_motion: Some(Motion { started_at, settled_at: Some(settled_at) }),
        });
        tracing::debug!(piston = ?self.id, position = target, "piston settled");

        target
    }
}
