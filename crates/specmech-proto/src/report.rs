//! Status report bodies.
//!
//! Each category has a fixed comma-separated schema. The `?` after `S` is the
//! schema digit chosen per deployment:
//!
//! ```text
//! S?BTM,<boot>
//! S?MRA,<position>                          (MRB, MRC)
//! S?ENV,<T0>C,<H0>%,0,...,<T3>C,<H3>%,3
//! S?ION,<r>,r,<b>,b
//! S?ACC,<x>,<y>,<z>
//! S?PNU,<s>,s,<l>,l,<r>,r,<p>,p
//! S?TIM,<time>[,<set>,set,<boot>,boot[,<cmdId>]]
//! S?VER,<version>
//! ```

use chrono::{DateTime, Utc};

use crate::{TIMESTAMP_FORMAT, command::PistonId};

/// Door state as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoorState {
    /// `o`
    Open,
    /// `c`
    Closed,
    /// `t`: moving between the two.
    Transitioning,
}

impl DoorState {
    /// Wire letter.
    pub fn as_char(self) -> char {
        match self {
            Self::Open => 'o',
            Self::Closed => 'c',
            Self::Transitioning => 't',
        }
    }
}

/// One temperature/humidity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateReading {
    /// Degrees Celsius.
    pub temperature: i32,
    /// Relative humidity, percent.
    pub humidity: i32,
}

/// Extra clock detail carried by the extended `TIM` report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockDetail {
    /// When the clock was last set (boot time if never).
    pub set_at: DateTime<Utc>,
    /// Controller boot time.
    pub boot: DateTime<Utc>,
    /// Id of the command that asked for the report.
    pub command_id: Option<String>,
}

/// One report sentence worth of data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// `BTM`
    BootTime(DateTime<Utc>),
    /// `MRA`/`MRB`/`MRC`
    Piston {
        /// Which piston.
        piston: PistonId,
        /// Encoder position.
        position: i64,
    },
    /// `ENV`
    Environment([ClimateReading; 4]),
    /// `ION`
    IonPumps {
        /// Red pump voltage.
        red: i32,
        /// Blue pump voltage.
        blue: i32,
    },
    /// `ACC`
    Accelerometer {
        /// X axis.
        x: i32,
        /// Y axis.
        y: i32,
        /// Z axis.
        z: i32,
    },
    /// `PNU`
    Pneumatics {
        /// Shutter.
        shutter: DoorState,
        /// Left Hartmann door.
        left: DoorState,
        /// Right Hartmann door.
        right: DoorState,
        /// Air pressure.
        pressure: i32,
    },
    /// `TIM`
    Time {
        /// Controller time (wall time plus offset).
        now: DateTime<Utc>,
        /// Present on revisions that report set/boot time.
        detail: Option<ClockDetail>,
    },
    /// `VER`
    Version(String),
}

impl Report {
    /// Sentence body, without `$`, checksum or line ending.
    pub fn body(&self, schema: char) -> String {
        match self {
            Self::BootTime(boot) => format!("S{schema}BTM,{}", timestamp(boot)),
            Self::Piston { piston, position } => {
                format!("S{schema}MR{},{position}", piston.report_letter())
            },
            Self::Environment(probes) => {
                let fields: Vec<String> = probes
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("{}C,{}%,{i}", p.temperature, p.humidity))
                    .collect();
                format!("S{schema}ENV,{}", fields.join(","))
            },
            Self::IonPumps { red, blue } => format!("S{schema}ION,{red},r,{blue},b"),
            Self::Accelerometer { x, y, z } => format!("S{schema}ACC,{x},{y},{z}"),
            Self::Pneumatics { shutter, left, right, pressure } => format!(
                "S{schema}PNU,{},s,{},l,{},r,{pressure},p",
                shutter.as_char(),
                left.as_char(),
                right.as_char()
            ),
            Self::Time { now, detail: None } => format!("S{schema}TIM,{}", timestamp(now)),
            Self::Time { now, detail: Some(detail) } => {
                let mut body = format!(
                    "S{schema}TIM,{},{},set,{},boot",
                    timestamp(now),
                    timestamp(&detail.set_at),
                    timestamp(&detail.boot)
                );
                if let Some(id) = &detail.command_id {
                    body.push(',');
                    body.push_str(id);
                }
                body
            },
            Self::Version(version) => format!("S{schema}VER,{version}"),
        }
    }
}

/// Format a timestamp in the controller's fixed profile.
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
