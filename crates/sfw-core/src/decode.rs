// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frame and sample decoding off the wire.

use crate::kind::SensorKind;
use crate::sample::{
    normalize, CompassReading, LidReading, MagnetometerReading, OrientationReading,
    ProximityReading, Reading, TapReading, U32Reading, XyzReading,
};
use thiserror::Error;

/// Minimum/maximum sample count allowed in a single frame.
pub const MIN_FRAME_COUNT: u32 = 1;
pub const MAX_FRAME_COUNT: u32 = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("sample count {0} out of range 1..=16")]
    InvalidCount(u32),
    #[error("short sample read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },
}

/// Validate a frame's sample count against the invariant `1 <= count <= 16`.
pub fn validate_count(count: u32) -> Result<(), DecodeError> {
    if (MIN_FRAME_COUNT..=MAX_FRAME_COUNT).contains(&count) {
        Ok(())
    } else {
        Err(DecodeError::InvalidCount(count))
    }
}

/// Decode `count` fixed-size records of `kind` out of `bytes`, applying
/// normalization to each. `bytes` must be exactly
/// `count * kind.wire_sample_size()` long.
pub fn decode_frame(kind: SensorKind, count: u32, bytes: &[u8]) -> Result<Vec<Reading>, DecodeError> {
    validate_count(count)?;
    let sample_size = kind.wire_sample_size();
    let expected = sample_size * count as usize;
    if bytes.len() != expected {
        return Err(DecodeError::ShortRead {
            expected,
            actual: bytes.len(),
        });
    }

    let mut readings = Vec::with_capacity(count as usize);
    for chunk in bytes.chunks_exact(sample_size) {
        let mut reading = decode_sample(kind, chunk)?;
        normalize(&mut reading);
        readings.push(reading);
    }
    Ok(readings)
}

/// Decode a single raw (not yet normalized) sample record.
pub fn decode_sample(kind: SensorKind, buf: &[u8]) -> Result<Reading, DecodeError> {
    let expected = kind.wire_sample_size();
    if buf.len() != expected {
        return Err(DecodeError::ShortRead {
            expected,
            actual: buf.len(),
        });
    }

    let mut c = Cursor::new(buf);
    Ok(match kind {
        SensorKind::Accelerometer => Reading::Accelerometer(XyzReading {
            timestamp: c.u64(),
            x: c.f32(),
            y: c.f32(),
            z: c.f32(),
        }),
        SensorKind::Gyroscope => Reading::Gyroscope(XyzReading {
            timestamp: c.u64(),
            x: c.f32(),
            y: c.f32(),
            z: c.f32(),
        }),
        SensorKind::Rotation => Reading::Rotation(XyzReading {
            timestamp: c.u64(),
            x: c.f32(),
            y: c.f32(),
            z: c.f32(),
        }),
        SensorKind::Als => Reading::Als(U32Reading {
            timestamp: c.u64(),
            value: c.u32(),
        }),
        SensorKind::Humidity => Reading::Humidity(U32Reading {
            timestamp: c.u64(),
            value: c.u32(),
        }),
        SensorKind::Pressure => Reading::Pressure(U32Reading {
            timestamp: c.u64(),
            value: c.u32(),
        }),
        SensorKind::Stepcounter => Reading::Stepcounter(U32Reading {
            timestamp: c.u64(),
            value: c.u32(),
        }),
        SensorKind::Temperature => Reading::Temperature(U32Reading {
            timestamp: c.u64(),
            value: c.u32(),
        }),
        SensorKind::Proximity => Reading::Proximity(ProximityReading {
            timestamp: c.u64(),
            distance: c.u32(),
            proximity: c.u8(),
        }),
        SensorKind::Orientation => Reading::Orientation(OrientationReading {
            timestamp: c.u64(),
            state: c.i32(),
        }),
        SensorKind::Compass => Reading::Compass(CompassReading {
            timestamp: c.u64(),
            degrees: c.i32(),
            raw_degrees: c.i32(),
            corrected_degrees: c.i32(),
            level: c.i32(),
        }),
        SensorKind::Lid => Reading::Lid(LidReading {
            timestamp: c.u64(),
            lid_type: c.i32(),
            value: c.u32(),
        }),
        SensorKind::Magnetometer => Reading::Magnetometer(MagnetometerReading {
            timestamp: c.u64(),
            x: c.i32(),
            y: c.i32(),
            z: c.i32(),
            rx: c.i32(),
            ry: c.i32(),
            rz: c.i32(),
            level: c.i32(),
        }),
        SensorKind::Tap => Reading::Tap(TapReading {
            timestamp: c.u64(),
            direction: c.u32(),
            tap_type: c.i32(),
        }),
    })
}

/// A tiny little-endian cursor over a byte slice known to be exactly the
/// right length (checked by the caller above); each accessor panics on
/// underrun, which cannot happen given that precondition.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take())
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }
}

#[cfg(test)]
#[path = "decode_tests.rs"]
mod tests;
