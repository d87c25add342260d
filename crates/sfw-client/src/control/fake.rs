// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable fake control client: an `Arc<Mutex<...>>` of recorded calls
//! plus scriptable per-plugin responses, so `Service`/`Plugin`/`Sensor`
//! tests never touch a real bus.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use zbus::zvariant::OwnedValue;

use super::{ControlClient, ControlError};

/// Recorded control-plane call, for assertions in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCall {
    LoadPlugin { plugin_name: String },
    RequestSensor { plugin_name: String },
    ReleaseSensor { plugin_name: String, session_id: i32 },
    Start { plugin_name: String, session_id: i32 },
    Stop { plugin_name: String, session_id: i32 },
    SetDataRate { plugin_name: String, session_id: i32, rate_hz: f64 },
    SetStandbyOverride { plugin_name: String, session_id: i32, allowed: bool },
    AvailableSensorPlugins,
    GetAllProperties { plugin_name: String },
}

struct FakeState {
    calls: Vec<ControlCall>,
    next_session_id: i32,
    load_plugin_result: Result<bool, String>,
    request_sensor_result: Result<i32, String>,
    release_sensor_result: Result<bool, String>,
    start_result: Result<(), String>,
    stop_result: Result<(), String>,
    set_data_rate_result: Result<(), String>,
    set_standby_override_result: Result<bool, String>,
    available_sensor_plugins_result: Result<(), String>,
    available_sensor_plugins: Vec<String>,
    properties: HashMap<String, HashMap<String, OwnedValue>>,
    owner_tx: watch::Sender<bool>,
}

/// Fake [`ControlClient`]. Every method succeeds with a sensible default
/// until overridden via the `fail_*`/`set_*` setters below.
#[derive(Clone)]
pub struct FakeControlClient {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeControlClient {
    fn default() -> Self {
        let (owner_tx, _rx) = watch::channel(true);
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                next_session_id: 1,
                load_plugin_result: Ok(true),
                request_sensor_result: Ok(0),
                release_sensor_result: Ok(true),
                start_result: Ok(()),
                stop_result: Ok(()),
                set_data_rate_result: Ok(()),
                set_standby_override_result: Ok(true),
                available_sensor_plugins_result: Ok(()),
                available_sensor_plugins: Vec::new(),
                properties: HashMap::new(),
                owner_tx,
            })),
        }
    }
}

impl FakeControlClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ControlCall> {
        self.inner.lock().calls.clone()
    }

    pub fn set_available_sensor_plugins(&self, plugins: Vec<String>) {
        self.inner.lock().available_sensor_plugins = plugins;
    }

    pub fn set_properties(&self, plugin_name: &str, props: HashMap<String, OwnedValue>) {
        self.inner
            .lock()
            .properties
            .insert(plugin_name.to_string(), props);
    }

    pub fn fail_load_plugin(&self, message: impl Into<String>) {
        self.inner.lock().load_plugin_result = Err(message.into());
    }

    pub fn set_load_plugin_result(&self, ok: bool) {
        self.inner.lock().load_plugin_result = Ok(ok);
    }

    pub fn fail_request_sensor(&self, message: impl Into<String>) {
        self.inner.lock().request_sensor_result = Err(message.into());
    }

    pub fn set_release_sensor_result(&self, ok: bool) {
        self.inner.lock().release_sensor_result = Ok(ok);
    }

    pub fn fail_start(&self, message: impl Into<String>) {
        self.inner.lock().start_result = Err(message.into());
    }

    pub fn fail_available_sensor_plugins(&self, message: impl Into<String>) {
        self.inner.lock().available_sensor_plugins_result = Err(message.into());
    }

    pub fn clear_available_sensor_plugins_failure(&self) {
        self.inner.lock().available_sensor_plugins_result = Ok(());
    }

    pub fn fail_stop(&self, message: impl Into<String>) {
        self.inner.lock().stop_result = Err(message.into());
    }

    pub fn fail_set_data_rate(&self, message: impl Into<String>) {
        self.inner.lock().set_data_rate_result = Err(message.into());
    }

    /// Script `setStandbyOverride` to come back rejected, as happens on
    /// hardware that doesn't support it.
    pub fn fail_set_standby_override(&self, message: impl Into<String>) {
        self.inner.lock().set_standby_override_result = Err(message.into());
    }

    /// Flip the simulated bus-name ownership, as if the daemon had
    /// crashed (`false`) or restarted (`true`).
    pub fn set_service_owned(&self, owned: bool) {
        let _ = self.inner.lock().owner_tx.send(owned);
    }
}

#[async_trait]
impl ControlClient for FakeControlClient {
    async fn load_plugin(&self, plugin_name: &str) -> Result<bool, ControlError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::LoadPlugin {
            plugin_name: plugin_name.to_string(),
        });
        inner.load_plugin_result.clone().map_err(ControlError::Call)
    }

    async fn request_sensor(&self, plugin_name: &str) -> Result<i32, ControlError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::RequestSensor {
            plugin_name: plugin_name.to_string(),
        });
        match inner.request_sensor_result.clone() {
            Ok(_) => {
                let id = inner.next_session_id;
                inner.next_session_id += 1;
                Ok(id)
            }
            Err(message) => Err(ControlError::Call(message)),
        }
    }

    async fn release_sensor(
        &self,
        plugin_name: &str,
        session_id: i32,
    ) -> Result<bool, ControlError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::ReleaseSensor {
            plugin_name: plugin_name.to_string(),
            session_id,
        });
        inner
            .release_sensor_result
            .clone()
            .map_err(ControlError::Call)
    }

    async fn start(&self, plugin_name: &str, session_id: i32) -> Result<(), ControlError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::Start {
            plugin_name: plugin_name.to_string(),
            session_id,
        });
        inner.start_result.clone().map_err(ControlError::Call)
    }

    async fn stop(&self, plugin_name: &str, session_id: i32) -> Result<(), ControlError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::Stop {
            plugin_name: plugin_name.to_string(),
            session_id,
        });
        inner.stop_result.clone().map_err(ControlError::Call)
    }

    async fn set_data_rate(
        &self,
        plugin_name: &str,
        session_id: i32,
        rate_hz: f64,
    ) -> Result<(), ControlError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::SetDataRate {
            plugin_name: plugin_name.to_string(),
            session_id,
            rate_hz,
        });
        inner.set_data_rate_result.clone().map_err(ControlError::Call)
    }

    async fn set_standby_override(
        &self,
        plugin_name: &str,
        session_id: i32,
        allowed: bool,
    ) -> Result<bool, ControlError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::SetStandbyOverride {
            plugin_name: plugin_name.to_string(),
            session_id,
            allowed,
        });
        inner
            .set_standby_override_result
            .clone()
            .map_err(ControlError::Call)
    }

    async fn available_sensor_plugins(&self) -> Result<Vec<String>, ControlError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::AvailableSensorPlugins);
        inner
            .available_sensor_plugins_result
            .clone()
            .map_err(ControlError::Call)?;
        Ok(inner.available_sensor_plugins.clone())
    }

    async fn get_all_properties(
        &self,
        plugin_name: &str,
    ) -> Result<HashMap<String, OwnedValue>, ControlError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ControlCall::GetAllProperties {
            plugin_name: plugin_name.to_string(),
        });
        Ok(inner
            .properties
            .get(plugin_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn watch_service_owner(&self) -> Result<watch::Receiver<bool>, ControlError> {
        Ok(self.inner.lock().owner_tx.subscribe())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
