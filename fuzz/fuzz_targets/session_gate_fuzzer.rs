//! Fuzz target for the reboot gate
//!
//! Prevent operational commands from reaching devices before the wake
//! handshake.
//!
//! # Strategy
//!
//! - Event sequences: wake, reboot, quit, and arbitrary sentences
//! - Both firmware revisions
//!
//! # Invariants
//!
//! - While awaiting wake, anything but `!` and `q` gets exactly the wake prompt
//! - While awaiting wake, piston positions and the clock offset never change
//! - Only `!` opens the gate; only a reboot command closes it
//! - `q` always closes the connection without a reply
//! - NEVER panic on any input

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use chrono::{DateTime, TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use specmech_core::{
    DeviceSeeds, Environment, GateState, ProtocolConfig, ProtocolEngine, Revision, SessionAction,
};
use specmech_proto::PistonId;
use tokio::time::Instant;

/// Frozen clock; the gate never sleeps.
#[derive(Clone)]
struct FuzzEnv;

impl Environment for FuzzEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 12, 17, 10, 0, 0).single().unwrap_or_default()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum GateEvent {
    Wake,
    Reboot,
    Quit,
    Sentence(Vec<u8>),
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    extended: bool,
    events: Vec<GateEvent>,
}

fuzz_target!(|input: FuzzInput| {
    let revision = if input.extended { Revision::Extended } else { Revision::Legacy };
    let engine = ProtocolEngine::new(
        FuzzEnv,
        ProtocolConfig::for_revision(revision),
        &DeviceSeeds::default(),
    );
    let composer = *engine.composer();

    for event in input.events {
        let raw = match event {
            GateEvent::Wake => b"!\r".to_vec(),
            GateEvent::Reboot => b"R\r\n".to_vec(),
            GateEvent::Quit => b"q\r".to_vec(),
            GateEvent::Sentence(mut bytes) => {
                bytes.push(b'\r');
                bytes
            },
        };

        let before = engine.gate().state();
        let positions = PistonId::ALL.map(|id| engine.registry().piston(id).position());
        let offset = engine.registry().clock().offset();

        let actions = engine.handle(&raw);
        let after = engine.gate().state();

        if raw == b"q\r" || raw == b"q\r\n" {
            assert_eq!(actions, vec![SessionAction::Close]);
            assert_eq!(before, after);
            continue;
        }

        match before {
            GateState::AwaitingWake if raw == b"!\r" || raw == b"!\r\n" => {
                assert_eq!(after, GateState::Operational);
                assert_eq!(actions, vec![SessionAction::Send(composer.ack(None))]);
            },
            GateState::AwaitingWake => {
                assert_eq!(after, GateState::AwaitingWake);
                assert_eq!(actions, vec![SessionAction::Send(composer.wake_prompt())]);
                let now = PistonId::ALL.map(|id| engine.registry().piston(id).position());
                assert_eq!(positions, now);
                assert_eq!(offset, engine.registry().clock().offset());
            },
            GateState::Operational => {
                if after == GateState::AwaitingWake {
                    assert!(raw.starts_with(b"R"), "gate closed by {raw:?}");
                }
                assert!(!actions.contains(&SessionAction::Send(composer.wake_prompt())));
            },
        }
    }
});
