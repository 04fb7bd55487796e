//! Read-only sensors.
//!
//! The protocol only ever reads these. Harnesses can overwrite them to
//! script scenarios (a failing ion pump, a humid enclosure).

use specmech_proto::ClimateReading;
use tokio::sync::watch;

/// Accelerometer axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acceleration {
    /// X axis.
    pub x: i32,
    /// Y axis.
    pub y: i32,
    /// Z axis.
    pub z: i32,
}

/// Ion pump voltages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IonPumpVoltages {
    /// Red camera pump.
    pub red: i32,
    /// Blue camera pump.
    pub blue: i32,
}

/// All sensor readings at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReadings {
    /// Accelerometer.
    pub accelerometer: Acceleration,
    /// Ion pumps.
    pub ion_pumps: IonPumpVoltages,
    /// Four temperature/humidity probes.
    pub climate: [ClimateReading; 4],
    /// Barometric pressure.
    pub pressure: i32,
}

/// Sensor bank.
#[derive(Debug)]
pub struct Sensors {
    readings: watch::Sender<SensorReadings>,
}

impl Sensors {
    /// Create a bank with seed readings.
    pub fn new(readings: SensorReadings) -> Self {
        let (readings, _) = watch::channel(readings);
        Self { readings }
    }

    /// Snapshot of every reading.
    pub fn readings(&self) -> SensorReadings {
        *self.readings.borrow()
    }

    /// Overwrite the accelerometer.
    pub fn set_accelerometer(&self, accelerometer: Acceleration) {
        self.readings.send_modify(|r| r.accelerometer = accelerometer);
    }

    /// Overwrite the ion pump voltages.
    pub fn set_ion_pumps(&self, ion_pumps: IonPumpVoltages) {
        self.readings.send_modify(|r| r.ion_pumps = ion_pumps);
    }

    /// Overwrite one climate probe. Out-of-range indices are ignored.
    pub fn set_climate(&self, probe: usize, reading: ClimateReading) {
        self.readings.send_modify(|r| {
            if let Some(slot) = r.climate.get_mut(probe) {
                *slot = reading;
            }
        });
    }

    /// Overwrite the barometric pressure.
    pub fn set_pressure(&self, pressure: i32) {
        self.readings.send_modify(|r| r.pressure = pressure);
    }
}
