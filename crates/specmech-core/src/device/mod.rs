//! Device registry.
//!
//! The single owner of every simulated actuator and sensor. It is built once
//! at startup from [`DeviceSeeds`] and shared by all sessions behind an
//! `Arc`; each device guards its own state, so there is no registry-wide
//! lock.
//!
//! ```text
//! DeviceRegistry
//!   ├─ Door × 3      (shutter, left/right Hartmann)
//!   ├─ Piston × 3    (collimator A, B, C)
//!   ├─ Sensors       (accelerometer, ion pumps, climate, pressure)
//!   └─ Clock         (boot time, operator offset)
//! ```

mod clock;
mod door;
mod piston;
mod sensors;

use std::time::Duration;

use chrono::{DateTime, Utc};
pub use clock::Clock;
pub use door::{Door, DoorStatus};
pub use piston::{Drive, Piston, PistonMove, PistonStatus};
pub use sensors::{Acceleration, IonPumpVoltages, SensorReadings, Sensors};
use specmech_proto::{ClimateReading, DoorId, DoorState, PistonId};
use tokio::time::Instant;

/// Start and end of an actuator transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    /// When the actuator left its settled state.
    pub started_at: Instant,
    /// When it settled again. `None` while still moving.
    pub settled_at: Option<Instant>,
}

impl Motion {
    /// Time spent moving, once settled.
    pub fn duration(&self) -> Option<Duration> {
        self.settled_at.map(|end| end - self.started_at)
    }

    /// Whether two transitions were in progress at the same time.
    pub fn overlaps(&self, other: &Self) -> bool {
        let (Some(a_end), Some(b_end)) = (self.settled_at, other.settled_at) else {
            return true;
        };
        self.started_at < b_end && other.started_at < a_end
    }
}

/// Initial values for every device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSeeds {
    /// Piston A, B, C positions.
    pub pistons: [i64; 3],
    /// Shutter, left and right door states.
    pub doors: [DoorState; 3],
    /// Sensor readings.
    pub sensors: SensorReadings,
}

impl Default for DeviceSeeds {
    fn default() -> Self {
        Self {
            pistons: [234_324; 3],
            doors: [DoorState::Closed; 3],
            sensors: SensorReadings {
                accelerometer: Acceleration { x: 32, y: 100, z: 989 },
                ion_pumps: IonPumpVoltages { red: 1432, blue: 1243 },
                climate: [
                    ClimateReading { temperature: 12, humidity: 44 },
                    ClimateReading { temperature: 13, humidity: 42 },
                    ClimateReading { temperature: 11, humidity: 48 },
                    ClimateReading { temperature: 12, humidity: 43 },
                ],
                pressure: 1,
            },
        }
    }
}

/// Every simulated device of one controller.
#[derive(Debug)]
pub struct DeviceRegistry {
    doors: [Door; 3],
    pistons: [Piston; 3],
    sensors: Sensors,
    clock: Clock,
}

impl DeviceRegistry {
    /// Build the registry from seeds. `boot` is the controller boot time.
    pub fn new(seeds: &DeviceSeeds, boot: DateTime<Utc>) -> Self {
        let [shutter, left, right] = seeds.doors;
        let [a, b, c] = seeds.pistons;

        Self {
            doors: [
                Door::new(DoorId::Shutter, shutter),
                Door::new(DoorId::Left, left),
                Door::new(DoorId::Right, right),
            ],
            pistons: [
                Piston::new(PistonId::A, a),
                Piston::new(PistonId::B, b),
                Piston::new(PistonId::C, c),
            ],
            sensors: Sensors::new(seeds.sensors),
            clock: Clock::new(boot),
        }
    }

    /// A door by id.
    pub fn door(&self, id: DoorId) -> &Door {
        match id {
            DoorId::Shutter => &self.doors[0],
            DoorId::Left => &self.doors[1],
            DoorId::Right => &self.doors[2],
        }
    }

    /// A piston by id.
    pub fn piston(&self, id: PistonId) -> &Piston {
        match id {
            PistonId::A => &self.pistons[0],
            PistonId::B => &self.pistons[1],
            PistonId::C => &self.pistons[2],
        }
    }

    /// The sensor bank.
    pub fn sensors(&self) -> &Sensors {
        &self.sensors
    }

    /// The controller clock.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }
}
