// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sensor kind table: plugin/object/interface names and wire sizes.

/// One of the sensor kinds the daemon exposes.
///
/// Each variant carries a fixed set of names (derived via the methods
/// below) and a fixed wire-sample size; see `sample.rs` for the record
/// layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Proximity,
    Als,
    Orientation,
    Accelerometer,
    Compass,
    Gyroscope,
    Lid,
    Humidity,
    Magnetometer,
    Pressure,
    Rotation,
    Stepcounter,
    Tap,
    Temperature,
}

impl SensorKind {
    pub const ALL: [SensorKind; 14] = [
        SensorKind::Proximity,
        SensorKind::Als,
        SensorKind::Orientation,
        SensorKind::Accelerometer,
        SensorKind::Compass,
        SensorKind::Gyroscope,
        SensorKind::Lid,
        SensorKind::Humidity,
        SensorKind::Magnetometer,
        SensorKind::Pressure,
        SensorKind::Rotation,
        SensorKind::Stepcounter,
        SensorKind::Tap,
        SensorKind::Temperature,
    ];

    /// Plugin name and daemon-side sensor name (same fixed string, used for
    /// `loadPlugin`, `requestSensor`, `releaseSensor`, and the object path).
    pub fn sensor_name(self) -> &'static str {
        match self {
            SensorKind::Proximity => "proximitysensor",
            SensorKind::Als => "alssensor",
            SensorKind::Orientation => "orientationsensor",
            SensorKind::Accelerometer => "accelerometersensor",
            SensorKind::Compass => "compasssensor",
            SensorKind::Gyroscope => "gyroscopesensor",
            SensorKind::Lid => "lidsensor",
            SensorKind::Humidity => "humiditysensor",
            SensorKind::Magnetometer => "magnetometersensor",
            SensorKind::Pressure => "pressuresensor",
            SensorKind::Rotation => "rotationsensor",
            SensorKind::Stepcounter => "stepcountersensor",
            SensorKind::Tap => "tapsensor",
            SensorKind::Temperature => "temperaturesensor",
        }
    }

    /// D-Bus interface name on the per-sensor object (`local.<Kind>Sensor`).
    pub fn interface_name(self) -> &'static str {
        match self {
            SensorKind::Proximity => "local.ProximitySensor",
            SensorKind::Als => "local.ALSSensor",
            SensorKind::Orientation => "local.OrientationSensor",
            SensorKind::Accelerometer => "local.AccelerometerSensor",
            SensorKind::Compass => "local.CompassSensor",
            SensorKind::Gyroscope => "local.GyroscopeSensor",
            SensorKind::Lid => "local.LidSensor",
            SensorKind::Humidity => "local.HumiditySensor",
            SensorKind::Magnetometer => "local.MagnetometerSensor",
            SensorKind::Pressure => "local.PressureSensor",
            SensorKind::Rotation => "local.RotationSensor",
            SensorKind::Stepcounter => "local.StepcounterSensor",
            SensorKind::Tap => "local.TapSensor",
            SensorKind::Temperature => "local.TemperatureSensor",
        }
    }

    /// Per-sensor object path, `/SensorManager/<name>`.
    pub fn object_path(self) -> String {
        format!("/SensorManager/{}", self.sensor_name())
    }

    /// Fixed wire-sample size in bytes.
    pub fn wire_sample_size(self) -> usize {
        match self {
            SensorKind::Accelerometer | SensorKind::Gyroscope | SensorKind::Rotation => 20,
            SensorKind::Als | SensorKind::Humidity | SensorKind::Pressure | SensorKind::Stepcounter => 12,
            SensorKind::Proximity => 13,
            SensorKind::Orientation => 12,
            SensorKind::Compass => 24,
            SensorKind::Lid => 16,
            SensorKind::Magnetometer => 36,
            SensorKind::Tap => 16,
            SensorKind::Temperature => 12,
        }
    }

    /// Look up a kind by its daemon-side sensor name.
    pub fn from_sensor_name(name: &str) -> Option<SensorKind> {
        SensorKind::ALL.into_iter().find(|k| k.sensor_name() == name)
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sensor_name())
    }
}

/// Largest wire-sample size across all kinds (magnetometer, 36 bytes).
/// Used as the upper sanity bound on a configured sample size.
pub const MAX_WIRE_SAMPLE_SIZE: usize = 36;

#[cfg(test)]
#[path = "kind_tests.rs"]
mod tests;
