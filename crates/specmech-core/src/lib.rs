//! specMech emulator core.
//!
//! Everything between a framed sentence and the reply bytes, with no I/O:
//!
//! ```text
//! specmech-core
//!   ├─ ProtocolEngine   (gate + parser + dispatcher, returns SessionActions)
//!   ├─ Dispatcher       (command routing, fan-out joins, report snapshots)
//!   ├─ RebootGate       (wake handshake shared by every connection)
//!   ├─ DeviceRegistry   (doors, pistons, sensors, clock)
//!   └─ Environment      (time abstraction: real, paused or simulated)
//! ```
//!
//! The server and the simulation harness drive the same engine; only the
//! [`Environment`] and the byte transport differ.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod device;
pub mod env;
pub mod gate;

mod dispatcher;
mod engine;

pub use config::{ConfigError, PistonLimits, PistonTiming, ProtocolConfig, Revision};
pub use device::{DeviceRegistry, DeviceSeeds, Motion};
pub use dispatcher::{Dispatcher, DoorMove, Operation};
pub use engine::{ProtocolEngine, SessionAction};
pub use env::Environment;
pub use gate::{GateState, RebootGate, SessionError};
