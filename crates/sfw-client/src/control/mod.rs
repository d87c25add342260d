// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! D-Bus control-plane abstraction over the sensord manager interface
//! (`com.nokia.SensorService` / `local.SensorManager`).
//!
//! `Service`, `Plugin` and `Sensor` talk to this trait, never to `zbus`
//! directly, so the three state machines can be unit-tested against
//! [`fake::FakeControlClient`] without a bus or a running daemon.

mod fake;
mod zbus_client;

pub use fake::{ControlCall, FakeControlClient};
pub use zbus_client::ZbusControlClient;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::watch;
use zbus::zvariant::OwnedValue;

/// Errors surfaced by the control plane. Kept coarse on purpose: every
/// tier's `Failed` state treats all of these the same way — log, retry
/// after [`crate::config::RETRY_DELAY`].
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("bus connection unavailable: {0}")]
    Transport(String),
    #[error("method call failed: {0}")]
    Call(String),
}

impl From<zbus::Error> for ControlError {
    fn from(err: zbus::Error) -> Self {
        match err {
            zbus::Error::InputOutput(_) | zbus::Error::Address(_) => {
                ControlError::Transport(err.to_string())
            }
            other => ControlError::Call(other.to_string()),
        }
    }
}

/// The manager + per-plugin method surface a tier needs, collapsed into
/// one trait regardless of which object path a method actually targets:
/// `local.SensorManager` methods and per-plugin `local.<Kind>` methods
/// both land here, since callers don't need the distinction.
#[async_trait]
pub trait ControlClient: Send + Sync + 'static {
    /// `loadPlugin(name) -> bool`.
    async fn load_plugin(&self, plugin_name: &str) -> Result<bool, ControlError>;

    /// `requestSensor(name) -> i32` session id.
    async fn request_sensor(&self, plugin_name: &str) -> Result<i32, ControlError>;

    /// `releaseSensor(name, session_id) -> bool`.
    async fn release_sensor(
        &self,
        plugin_name: &str,
        session_id: i32,
    ) -> Result<bool, ControlError>;

    /// `start(session_id)`.
    async fn start(&self, plugin_name: &str, session_id: i32) -> Result<(), ControlError>;

    /// `stop(session_id)`.
    async fn stop(&self, plugin_name: &str, session_id: i32) -> Result<(), ControlError>;

    /// `setDataRate(session_id, rate_hz)`.
    async fn set_data_rate(
        &self,
        plugin_name: &str,
        session_id: i32,
        rate_hz: f64,
    ) -> Result<(), ControlError>;

    /// `setStandbyOverride(session_id, allowed) -> bool`.
    async fn set_standby_override(
        &self,
        plugin_name: &str,
        session_id: i32,
        allowed: bool,
    ) -> Result<bool, ControlError>;

    /// `availableSensorPlugins() -> Vec<String>` on the manager.
    async fn available_sensor_plugins(&self) -> Result<Vec<String>, ControlError>;

    /// `org.freedesktop.DBus.Properties.GetAll` on a plugin's object.
    async fn get_all_properties(
        &self,
        plugin_name: &str,
    ) -> Result<HashMap<String, OwnedValue>, ControlError>;

    /// A live view of whether `com.nokia.SensorService` currently has a
    /// bus owner. The first value is sent immediately on subscribe so a
    /// caller never has to special-case "no change observed yet".
    /// Losing this flag to `false` is how `Service` notices the daemon
    /// left the bus without a direct method call failing first.
    async fn watch_service_owner(&self) -> Result<watch::Receiver<bool>, ControlError>;
}
