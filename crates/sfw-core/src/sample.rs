// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sample record schemas and the normalized reading union.
//!
//! Field layouts mirror the wire order exactly; decoding lives in
//! `decode.rs`, normalization rules are applied by `normalize()` below.

use crate::kind::SensorKind;

/// Acceleration in milli-g as decoded off the wire; `normalize()` converts
/// this in place to m/s².
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XyzReading {
    pub timestamp: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct U32Reading {
    pub timestamp: u64,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityReading {
    pub timestamp: u64,
    pub distance: u32,
    /// Non-zero means "near".
    pub proximity: u8,
}

impl ProximityReading {
    pub fn is_near(self) -> bool {
        self.proximity != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationReading {
    pub timestamp: u64,
    pub state: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompassReading {
    pub timestamp: u64,
    pub degrees: i32,
    pub raw_degrees: i32,
    pub corrected_degrees: i32,
    /// Bucket [0..3] on the wire; remapped to a percent [0..100] by `normalize()`.
    pub level: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LidReading {
    pub timestamp: u64,
    pub lid_type: i32,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnetometerReading {
    pub timestamp: u64,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub rx: i32,
    pub ry: i32,
    pub rz: i32,
    /// Bucket [0..3] on the wire; remapped to a percent [0..100] by `normalize()`.
    pub level: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapReading {
    pub timestamp: u64,
    pub direction: u32,
    pub tap_type: i32,
}

/// Tagged union of a decoded, normalized sample for any sensor kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Proximity(ProximityReading),
    Als(U32Reading),
    Orientation(OrientationReading),
    Accelerometer(XyzReading),
    Compass(CompassReading),
    Gyroscope(XyzReading),
    Lid(LidReading),
    Humidity(U32Reading),
    Magnetometer(MagnetometerReading),
    Pressure(U32Reading),
    Rotation(XyzReading),
    Stepcounter(U32Reading),
    Tap(TapReading),
    Temperature(U32Reading),
}

impl Reading {
    pub fn kind(&self) -> SensorKind {
        match self {
            Reading::Proximity(_) => SensorKind::Proximity,
            Reading::Als(_) => SensorKind::Als,
            Reading::Orientation(_) => SensorKind::Orientation,
            Reading::Accelerometer(_) => SensorKind::Accelerometer,
            Reading::Compass(_) => SensorKind::Compass,
            Reading::Gyroscope(_) => SensorKind::Gyroscope,
            Reading::Lid(_) => SensorKind::Lid,
            Reading::Humidity(_) => SensorKind::Humidity,
            Reading::Magnetometer(_) => SensorKind::Magnetometer,
            Reading::Pressure(_) => SensorKind::Pressure,
            Reading::Rotation(_) => SensorKind::Rotation,
            Reading::Stepcounter(_) => SensorKind::Stepcounter,
            Reading::Tap(_) => SensorKind::Tap,
            Reading::Temperature(_) => SensorKind::Temperature,
        }
    }
}

/// Standard gravity, m/s² per g. Accelerometer wire values are milli-g.
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// Remap a [0..3] level bucket into a [0..100] percent.
fn remap_level_percent(level: i32) -> i32 {
    match level {
        0 => 0,
        3 => 100,
        _ => (level * 100 / 3).clamp(0, 100),
    }
}

/// Apply the per-kind normalization rule in place. Idempotent only by
/// convention: callers must normalize each decoded sample exactly once.
pub fn normalize(reading: &mut Reading) {
    match reading {
        Reading::Accelerometer(xyz) => {
            let scale = (STANDARD_GRAVITY / 1000.0) as f32;
            xyz.x *= scale;
            xyz.y *= scale;
            xyz.z *= scale;
        }
        Reading::Gyroscope(xyz) => {
            xyz.x *= 1e-3;
            xyz.y *= 1e-3;
            xyz.z *= 1e-3;
        }
        Reading::Magnetometer(m) => {
            m.level = remap_level_percent(m.level);
        }
        Reading::Compass(c) => {
            c.level = remap_level_percent(c.level);
        }
        // Rotation, proximity, als, orientation, lid, humidity, pressure,
        // stepcounter, tap, temperature: identity.
        _ => {}
    }
}

#[cfg(test)]
#[path = "sample_tests.rs"]
mod tests;
