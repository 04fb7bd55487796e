//! Pneumatic doors: the shutter and the two Hartmann doors.
//!
//! ```text
//! closed --open()--> transitioning --(settle)--> open
//! open --close()--> transitioning --(settle)--> closed
//! ```
//!
//! Any other call is accepted and does nothing. A door that is
//! transitioning ignores both `open()` and `close()` until it settles.

use std::time::Duration;

use specmech_proto::{DoorId, DoorState};
use tokio::sync::watch;

use super::Motion;
use crate::env::Environment;

/// Observable state of a door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorStatus {
    /// Current state.
    pub state: DoorState,
    /// Latest transition, if the door has ever moved.
    pub last_motion: Option<Motion>,
}

/// A door with a timed transition.
#[derive(Debug)]
pub struct Door {
    id: DoorId,
    status: watch::Sender<DoorStatus>,
}

impl Door {
    /// Create a door in a settled state.
    pub fn new(id: DoorId, state: DoorState) -> Self {
        let (status, _) = watch::channel(DoorStatus { state, last_motion: None });
        Self { id, status }
    }

    /// Which door this is.
    pub fn id(&self) -> DoorId {
        self.id
    }

    /// Current state.
    pub fn state(&self) -> DoorState {
        self.status.borrow().state
    }

    /// Current state and latest transition.
    pub fn status(&self) -> DoorStatus {
        *self.status.borrow()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<DoorStatus> {
        self.status.subscribe()
    }

    /// Open if closed. Returns whether the door moved.
    pub async fn open<E: Environment>(&self, env: &E, settle: Duration) -> bool {
        self.transition(env, settle, DoorState::Closed, DoorState::Open).await
    }

    /// Close if open. Returns whether the door moved.
    pub async fn close<E: Environment>(&self, env: &E, settle: Duration) -> bool {
        self.transition(env, settle, DoorState::Open, DoorState::Closed).await
    }

    async fn transition<E: Environment>(
        &self,
        env: &E,
        settle: Duration,
        from: DoorState,
        to: DoorState,
    ) -> bool {
        let started_at = env.now();
        // State check and claim are one atomic step.
        let claimed = self.status.send_if_modified(|status| {
            if status.state != from {
                return false;
            }
            *status = DoorStatus {
                state: DoorState::Transitioning,
                last_motion: Some(Motion { started_at, settled_at: None }),
            };
            true
        });

        if !claimed {
            tracing::trace!(door = ?self.id, state = ?self.state(), target = ?to, "door no-op");
            return false;
        }
        tracing::debug!(door = ?self.id, target = ?to, "door moving");

        env.sleep(settle).await;

        let settled_at = env.now();
        self.status.send_replace(DoorStatus {
            state: to,
            last_motion: Some(Motion { started_at, settled_at: Some(settled_at) }),
        });
        tracing::debug!(door = ?self.id, state = ?to, "door settled");

        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::env::testing::TestEnv;

    const SETTLE: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn open_passes_through_transitioning() {
        let env = TestEnv::new();
        let door = Arc::new(Door::new(DoorId::Shutter, DoorState::Closed));

        let task = tokio::spawn({
            let door = Arc::clone(&door);
            let env = env.clone();
            async move { door.open(&env, SETTLE).await }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(door.state(), DoorState::Transitioning);

        assert!(task.await.expect("open task"));
        assert_eq!(door.state(), DoorState::Open);

        let motion = door.status().last_motion.expect("door moved");
        assert_eq!(motion.duration(), Some(SETTLE));
    }

    #[tokio::test(start_paused = true)]
    async fn open_on_open_door_is_a_no_op() {
        let env = TestEnv::new();
        let door = Door::new(DoorId::Left, DoorState::Open);

        assert!(!door.open(&env, SETTLE).await);
        assert_eq!(door.status(), DoorStatus { state: DoorState::Open, last_motion: None });
    }

    #[tokio::test(start_paused = true)]
    async fn close_on_closed_door_is_a_no_op() {
        let env = TestEnv::new();
        let door = Door::new(DoorId::Right, DoorState::Closed);

        assert!(!door.close(&env, SETTLE).await);
        assert_eq!(door.state(), DoorState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_opens_move_once() {
        let env = TestEnv::new();
        let door = Door::new(DoorId::Shutter, DoorState::Closed);

        let (first, second) = tokio::join!(door.open(&env, SETTLE), door.open(&env, SETTLE));

        assert!(first ^ second, "exactly one open should move the door");
        assert_eq!(door.state(), DoorState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn close_while_transitioning_is_ignored() {
        let env = TestEnv::new();
        let door = Arc::new(Door::new(DoorId::Shutter, DoorState::Closed));

        let opening = tokio::spawn({
            let door = Arc::clone(&door);
            let env = env.clone();
            async move { door.open(&env, SETTLE).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(door.state(), DoorState::Transitioning);

        let start = env.now();
        assert!(!door.close(&env, SETTLE).await);
        assert_eq!(env.now(), start, "close must return without waiting");
        assert_eq!(door.state(), DoorState::Transitioning);

        assert!(opening.await.expect("open task"));
        assert_eq!(door.state(), DoorState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn open_while_transitioning_is_ignored() {
        let env = TestEnv::new();
        let door = Arc::new(Door::new(DoorId::Left, DoorState::Open));

        let closing = tokio::spawn({
            let door = Arc::clone(&door);
            let env = env.clone();
            async move { door.close(&env, SETTLE).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!door.open(&env, SETTLE).await);
        assert!(closing.await.expect("close task"));
        assert_eq!(door.state(), DoorState::Closed);
    }
}
