//! Reboot gate.
//!
//! After power-on or an `R` command the controller ignores everything until
//! a client sends the wake sentence `!`. The gate is per deployment, not per
//! connection: once any client wakes the controller, every connection is
//! operational, and a reboot from any client closes the gate for all.
//!
//! ```text
//!            "!"                      "R"
//! AwaitingWake ──> Operational ──> AwaitingWake
//! ```

use tokio::sync::watch;

/// Gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateState {
    /// Only the wake sentence is accepted.
    AwaitingWake,
    /// Commands are dispatched.
    Operational,
}

/// Command received while the gate is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Controller has not been woken since its last reboot.
    #[error("controller is awaiting the wake sentence")]
    AwaitingWake,
}

/// Process-wide reboot gate.
#[derive(Debug)]
pub struct RebootGate {
    state: watch::Sender<GateState>,
}

impl RebootGate {
    /// A gate that starts closed, as after power-on.
    pub fn new() -> Self {
        let (state, _) = watch::channel(GateState::AwaitingWake);
        Self { state }
    }

    /// Current state.
    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    /// Reject operational commands while closed.
    pub fn check(&self) -> Result<(), SessionError> {
        match self.state() {
            GateState::Operational => Ok(()),
            GateState::AwaitingWake => Err(SessionError::AwaitingWake),
        }
    }

    /// Open the gate. Returns `true` if it was closed.
    pub fn wake(&self) -> bool {
        self.state.send_if_modified(|state| {
            let was_closed = *state == GateState::AwaitingWake;
            *state = GateState::Operational;
            was_closed
        })
    }

    /// Close the gate.
    pub fn reboot(&self) {
        self.state.send_replace(GateState::AwaitingWake);
    }
}

impl Default for RebootGate {
    fn default() -> Self {
        Self::new()
    }
}
