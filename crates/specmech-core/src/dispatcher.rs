//! Command dispatcher.
//!
//! Maps a validated [`Command`] onto the device registry. Dispatch is split
//! in two so the wire can show a command as accepted before it has
//! completed:
//!
//! 1. [`Dispatcher::dispatch`] runs synchronously. It applies instant
//!    effects (clock set, reboot), snapshots reports, and returns the
//!    ordered [`SessionAction`]s for the session to execute.
//! 2. [`Dispatcher::perform`] runs the timed part of a command. Fan-out
//!    commands join every actuator they start before returning, so a
//!    session never reports a command complete while hardware is moving.
//!
//! ## Fan-out
//!
//! | command | concurrent step | then |
//! |---------|-----------------|------|
//! | `Mp`/`mp`/`mH` | pistons A, B, C | |
//! | `es` | open left + open right | open shutter |
//! | `el` | open left + close right | open shutter |
//! | `er` | close left + open right | open shutter |
//! | `ee` | close left + close right | close shutter |

use std::{sync::Arc, time::Duration};

use specmech_proto::{
    Action, ClockDetail, Command, DoorId, ExposeMode, PistonId, PistonSelector, ReplyComposer,
    Report, ReportTarget,
};

use crate::{
    config::ProtocolConfig,
    device::{DeviceRegistry, Drive, PistonMove},
    engine::SessionAction,
    env::Environment,
    gate::RebootGate,
};

/// Door direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorMove {
    /// Open the door.
    Open,
    /// Close the door.
    Close,
}

/// Timed work left over after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Move one door.
    Door {
        /// Which door.
        door: DoorId,
        /// Direction.
        direction: DoorMove,
    },
    /// Run an expose sequence.
    Expose(ExposeMode),
    /// Move pistons.
    Pistons {
        /// Addressed pistons.
        pistons: PistonSelector,
        /// Kind of move.
        request: PistonMove,
    },
    /// Stall the session.
    Wait(Duration),
}

/// Routes commands to devices.
pub struct Dispatcher<E>
where
    E: Environment,
{
    env: E,
    config: Arc<ProtocolConfig>,
    composer: ReplyComposer,
    registry: Arc<DeviceRegistry>,
    gate: Arc<RebootGate>,
}

impl<E> Clone for Dispatcher<E>
where
    E: Environment,
{
    fn clone(&self) -> Self {
        Self {
            env: self.env.clone(),
            config: Arc::clone(&self.config),
            composer: self.composer,
            registry: Arc::clone(&self.registry),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<E> Dispatcher<E>
where
    E: Environment,
{
    /// Create a dispatcher over shared devices.
    pub fn new(
        env: E,
        config: Arc<ProtocolConfig>,
        registry: Arc<DeviceRegistry>,
        gate: Arc<RebootGate>,
    ) -> Self {
        let composer = config.composer();
        Self { env, config, composer, registry, gate }
    }

    /// The device registry.
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    /// Plan a validated command. Only callable while the gate is open.
    pub fn dispatch(&self, command: &Command) -> Vec<SessionAction> {
        let id = command.command_id.as_deref();
        let ack = || SessionAction::Send(self.composer.ack(id));

        match &command.action {
            Action::Reboot => {
                self.gate.reboot();
                self.registry.clock().reset_offset();
                tracing::info!(command_id = id, "controller rebooted");
                vec![ack()]
            },
            Action::SetTime(target) => {
                self.registry.clock().set(self.env.wall_clock(), *target);
                vec![ack()]
            },
            Action::Report(target) => {
                let reports = self.reports(*target, id);
                vec![SessionAction::Send(self.composer.report(&reports, id))]
            },
            Action::Wait(duration) => {
                vec![SessionAction::Perform(Operation::Wait(*duration)), ack()]
            },
            Action::Open(door) => vec![ack(), door_op(*door, DoorMove::Open)],
            Action::Close(door) => vec![ack(), door_op(*door, DoorMove::Close)],
            Action::Expose(mode) => vec![ack(), SessionAction::Perform(Operation::Expose(*mode))],
            Action::MoveAbsolute { pistons, position } => {
                vec![ack(), pistons_op(*pistons, PistonMove::Absolute(*position))]
            },
            Action::MoveRelative { pistons, delta } => {
                vec![ack(), pistons_op(*pistons, PistonMove::Relative(*delta))]
            },
            Action::Home => vec![ack(), pistons_op(PistonSelector::All, PistonMove::Home)],
        }
    }

    /// Run timed work to completion.
    pub async fn perform(&self, operation: Operation) {
        match operation {
            Operation::Door { door, direction } => self.drive_door(door, direction).await,
            Operation::Expose(mode) => self.expose(mode).await,
            Operation::Pistons { pistons, request } => self.drive_pistons(pistons, request).await,
            Operation::Wait(duration) => self.env.sleep(duration).await,
        }
    }

    async fn drive_door(&self, door: DoorId, direction: DoorMove) {
        let door = self.registry.door(door);
        let settle = self.config.door_settle;
        match direction {
            DoorMove::Open => door.open(&self.env, settle).await,
            DoorMove::Close => door.close(&self.env, settle).await,
        };
    }

    async fn expose(&self, mode: ExposeMode) {
        let (left, right, shutter) = match mode {
            ExposeMode::Science => (DoorMove::Open, DoorMove::Open, DoorMove::Open),
            ExposeMode::LeftHartmann => (DoorMove::Open, DoorMove::Close, DoorMove::Open),
            ExposeMode::RightHartmann => (DoorMove::Close, DoorMove::Open, DoorMove::Open),
            ExposeMode::End => (DoorMove::Close, DoorMove::Close, DoorMove::Close),
        };

        tokio::join!(self.drive_door(DoorId::Left, left), self.drive_door(DoorId::Right, right));
        self.drive_door(DoorId::Shutter, shutter).await;
    }

    async fn drive_pistons(&self, pistons: PistonSelector, request: PistonMove) {
        let drive = Drive { timing: self.config.piston_timing, limits: self.config.piston_limits };
        let run = |id: PistonId| self.registry.piston(id).drive(&self.env, &drive, request);

        match pistons {
            PistonSelector::One(id) => {
                run(id).await;
            },
            PistonSelector::All => {
                tokio::join!(run(PistonId::A), run(PistonId::B), run(PistonId::C));
            },
        }
    }

    /// Snapshot the report sentences for a target.
    pub fn reports(&self, target: ReportTarget, command_id: Option<&str>) -> Vec<Report> {
        match target {
            ReportTarget::Status => [
                ReportTarget::BootTime,
                ReportTarget::Piston(PistonId::A),
                ReportTarget::Piston(PistonId::B),
                ReportTarget::Piston(PistonId::C),
                ReportTarget::Environment,
                ReportTarget::IonPumps,
                ReportTarget::Accelerometer,
                ReportTarget::Pneumatics,
                ReportTarget::Time,
                ReportTarget::Version,
            ]
            .into_iter()
            .map(|t| self.report(t, command_id))
            .collect(),
            single => vec![self.report(single, command_id)],
        }
    }

    fn report(&self, target: ReportTarget, command_id: Option<&str>) -> Report {
        let registry = &self.registry;
        let sensors = registry.sensors().readings();

        match target {
            ReportTarget::BootTime => Report::BootTime(registry.clock().boot_time()),
            ReportTarget::Piston(piston) => {
                Report::Piston { piston, position: registry.piston(piston).position() }
            },
            ReportTarget::Environment => Report::Environment(sensors.climate),
            ReportTarget::IonPumps => {
                Report::IonPumps { red: sensors.ion_pumps.red, blue: sensors.ion_pumps.blue }
            },
            ReportTarget::Accelerometer => {
                let a = sensors.accelerometer;
                Report::Accelerometer { x: a.x, y: a.y, z: a.z }
            },
            ReportTarget::Pneumatics => Report::Pneumatics {
                shutter: registry.door(DoorId::Shutter).state(),
                left: registry.door(DoorId::Left).state(),
                right: registry.door(DoorId::Right).state(),
                pressure: sensors.pressure,
            },
            ReportTarget::Time => {
                let clock = registry.clock();
                let detail = self.config.time_detail.then(|| ClockDetail {
                    set_at: clock.last_set(),
                    boot: clock.boot_time(),
                    command_id: command_id.map(str::to_string),
                });
                Report::Time { now: clock.now(self.env.wall_clock()), detail }
            },
            // `Status` is expanded by `reports` before reaching here.
            ReportTarget::Version | ReportTarget::Status => {
                Report::Version(self.config.version.clone())
            },
        }
    }
}

fn door_op(door: DoorId, direction: DoorMove) -> SessionAction {
    SessionAction::Perform(Operation::Door { door, direction })
}

fn pistons_op(pistons: PistonSelector, request: PistonMove) -> SessionAction {
    SessionAction::Perform(Operation::Pistons { pistons, request })
}
