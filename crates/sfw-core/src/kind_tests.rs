// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn all_kinds_have_distinct_sensor_names() {
    let mut names: Vec<&str> = SensorKind::ALL.iter().map(|k| k.sensor_name()).collect();
    let before = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), before);
}

#[test]
fn sensor_name_round_trips_through_lookup() {
    for kind in SensorKind::ALL {
        assert_eq!(SensorKind::from_sensor_name(kind.sensor_name()), Some(kind));
    }
}

#[test]
fn unknown_sensor_name_is_none() {
    assert_eq!(SensorKind::from_sensor_name("not-a-sensor"), None);
}

#[test]
fn object_path_is_rooted_at_sensor_manager() {
    assert_eq!(
        SensorKind::Proximity.object_path(),
        "/SensorManager/proximitysensor"
    );
}

#[yare::parameterized(
    proximity     = { SensorKind::Proximity,     "local.ProximitySensor" },
    als           = { SensorKind::Als,           "local.ALSSensor" },
    orientation   = { SensorKind::Orientation,   "local.OrientationSensor" },
    accelerometer = { SensorKind::Accelerometer, "local.AccelerometerSensor" },
    compass       = { SensorKind::Compass,       "local.CompassSensor" },
    gyroscope     = { SensorKind::Gyroscope,     "local.GyroscopeSensor" },
    lid           = { SensorKind::Lid,           "local.LidSensor" },
    humidity      = { SensorKind::Humidity,      "local.HumiditySensor" },
    magnetometer  = { SensorKind::Magnetometer,  "local.MagnetometerSensor" },
    pressure      = { SensorKind::Pressure,      "local.PressureSensor" },
    rotation      = { SensorKind::Rotation,      "local.RotationSensor" },
    stepcounter   = { SensorKind::Stepcounter,   "local.StepcounterSensor" },
    tap           = { SensorKind::Tap,           "local.TapSensor" },
    temperature   = { SensorKind::Temperature,   "local.TemperatureSensor" },
)]
fn interface_name_matches_fixed_mapping(kind: SensorKind, expected: &str) {
    assert_eq!(kind.interface_name(), expected);
}

#[test]
fn wire_sample_size_is_within_sanity_bounds() {
    for kind in SensorKind::ALL {
        let size = kind.wire_sample_size();
        assert!(size >= std::mem::size_of::<u32>());
        assert!(size <= MAX_WIRE_SAMPLE_SIZE);
    }
}

#[yare::parameterized(
    accelerometer = { SensorKind::Accelerometer, 20 },
    gyroscope     = { SensorKind::Gyroscope,     20 },
    rotation      = { SensorKind::Rotation,      20 },
    als           = { SensorKind::Als,           12 },
    humidity      = { SensorKind::Humidity,      12 },
    pressure      = { SensorKind::Pressure,      12 },
    stepcounter   = { SensorKind::Stepcounter,   12 },
    proximity     = { SensorKind::Proximity,     13 },
    orientation   = { SensorKind::Orientation,   12 },
    compass       = { SensorKind::Compass,       24 },
    lid           = { SensorKind::Lid,           16 },
    magnetometer  = { SensorKind::Magnetometer,  36 },
    tap           = { SensorKind::Tap,           16 },
    temperature   = { SensorKind::Temperature,   12 },
)]
fn wire_sample_size_matches_spec_table(kind: SensorKind, expected: usize) {
    assert_eq!(kind.wire_sample_size(), expected);
}
