// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed addresses and tunables for talking to the daemon, gathered in
//! one place so tests can override them instead of hardcoding strings
//! everywhere.

use std::time::Duration;

/// Well-known D-Bus name the daemon owns on the system bus.
pub const SERVICE_NAME: &str = "com.nokia.SensorService";

/// Sensor manager object path and interface.
pub const MANAGER_PATH: &str = "/SensorManager";
pub const MANAGER_INTERFACE: &str = "local.SensorManager";

/// Standard properties interface used for `GetAll`.
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Unix domain socket carrying the binary sample stream.
pub const DATA_SOCKET_PATH: &str = "/run/sensord.sock";

/// Uniform retry delay used by every tier's `Failed` state.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Handshake reply byte the daemon sends after accepting a session id.
pub const HANDSHAKE_ACK: u8 = b'\n';
