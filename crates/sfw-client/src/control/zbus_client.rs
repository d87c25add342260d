// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::StreamExt;
use sfw_core::SensorKind;
use tokio::sync::watch;
use zbus::zvariant::OwnedValue;

use super::{ControlClient, ControlError};
use crate::config::{MANAGER_INTERFACE, MANAGER_PATH, PROPERTIES_INTERFACE, SERVICE_NAME};

/// Real control-plane client: one shared system-bus connection, with a
/// fresh [`zbus::Proxy`] built per call since the destination object
/// path/interface differs between the manager and each plugin and
/// `#[zbus::proxy]`'s compile-time macro can't express that.
pub struct ZbusControlClient {
    connection: zbus::Connection,
}

impl ZbusControlClient {
    /// Connect to the system bus. Callers retry this themselves on
    /// failure using the tier's own `Failed`/retry-timer logic.
    pub async fn connect() -> Result<Self, ControlError> {
        let connection = zbus::Connection::system().await?;
        Ok(Self { connection })
    }

    async fn manager_proxy(&self) -> Result<zbus::Proxy<'_>, ControlError> {
        zbus::Proxy::new(&self.connection, SERVICE_NAME, MANAGER_PATH, MANAGER_INTERFACE)
            .await
            .map_err(Into::into)
    }

    async fn plugin_proxy(&self, plugin_name: &str) -> Result<zbus::Proxy<'_>, ControlError> {
        let kind = SensorKind::from_sensor_name(plugin_name)
            .ok_or_else(|| ControlError::Call(format!("unknown plugin name: {plugin_name}")))?;
        zbus::Proxy::new(
            &self.connection,
            SERVICE_NAME,
            kind.object_path(),
            kind.interface_name(),
        )
        .await
        .map_err(Into::into)
    }

    async fn properties_proxy(&self, plugin_name: &str) -> Result<zbus::Proxy<'_>, ControlError> {
        let kind = SensorKind::from_sensor_name(plugin_name)
            .ok_or_else(|| ControlError::Call(format!("unknown plugin name: {plugin_name}")))?;
        zbus::Proxy::new(
            &self.connection,
            SERVICE_NAME,
            kind.object_path(),
            PROPERTIES_INTERFACE,
        )
        .await
        .map_err(Into::into)
    }
}

#[async_trait]
impl ControlClient for ZbusControlClient {
    async fn load_plugin(&self, plugin_name: &str) -> Result<bool, ControlError> {
        let proxy = self.manager_proxy().await?;
        proxy
            .call("loadPlugin", &(plugin_name,))
            .await
            .map_err(Into::into)
    }

    async fn request_sensor(&self, plugin_name: &str) -> Result<i32, ControlError> {
        let proxy = self.manager_proxy().await?;
        // The daemon's `requestSensor` takes the caller pid as a second
        // argument purely for its own bookkeeping; every call from this
        // process uses the same value.
        proxy
            .call("requestSensor", &(plugin_name, std::process::id() as i64))
            .await
            .map_err(Into::into)
    }

    async fn release_sensor(
        &self,
        plugin_name: &str,
        _session_id: i32,
    ) -> Result<bool, ControlError> {
        // The wire call only takes the plugin name; the
        // session id is accepted on this trait purely so fakes can
        // assert which session a release belongs to in tests.
        let proxy = self.manager_proxy().await?;
        proxy
            .call("releaseSensor", &(plugin_name,))
            .await
            .map_err(Into::into)
    }

    async fn start(&self, plugin_name: &str, session_id: i32) -> Result<(), ControlError> {
        let proxy = self.plugin_proxy(plugin_name).await?;
        proxy
            .call("start", &(session_id,))
            .await
            .map_err(Into::into)
    }

    async fn stop(&self, plugin_name: &str, session_id: i32) -> Result<(), ControlError> {
        let proxy = self.plugin_proxy(plugin_name).await?;
        proxy
            .call("stop", &(session_id,))
            .await
            .map_err(Into::into)
    }

    async fn set_data_rate(
        &self,
        plugin_name: &str,
        session_id: i32,
        rate_hz: f64,
    ) -> Result<(), ControlError> {
        let proxy = self.plugin_proxy(plugin_name).await?;
        proxy
            .call("setDataRate", &(session_id, rate_hz))
            .await
            .map_err(Into::into)
    }

    async fn set_standby_override(
        &self,
        plugin_name: &str,
        session_id: i32,
        allowed: bool,
    ) -> Result<bool, ControlError> {
        let proxy = self.plugin_proxy(plugin_name).await?;
        proxy
            .call("setStandbyOverride", &(session_id, allowed))
            .await
            .map_err(Into::into)
    }

    async fn available_sensor_plugins(&self) -> Result<Vec<String>, ControlError> {
        let proxy = self.manager_proxy().await?;
        proxy
            .call("availableSensorPlugins", &())
            .await
            .map_err(Into::into)
    }

    async fn get_all_properties(
        &self,
        plugin_name: &str,
    ) -> Result<HashMap<String, OwnedValue>, ControlError> {
        let proxy = self.properties_proxy(plugin_name).await?;
        let kind = SensorKind::from_sensor_name(plugin_name)
            .ok_or_else(|| ControlError::Call(format!("unknown plugin name: {plugin_name}")))?;
        proxy
            .call("GetAll", &(kind.interface_name(),))
            .await
            .map_err(Into::into)
    }

    async fn watch_service_owner(&self) -> Result<watch::Receiver<bool>, ControlError> {
        let dbus_proxy = zbus::fdo::DBusProxy::new(&self.connection).await?;
        let has_owner = dbus_proxy.name_has_owner(SERVICE_NAME).await?;
        let (tx, rx) = watch::channel(has_owner);

        let mut changes = dbus_proxy.receive_name_owner_changed().await?;
        tokio::spawn(async move {
            while let Some(signal) = changes.next().await {
                let Ok(args) = signal.args() else { continue };
                if args.name().as_str() != SERVICE_NAME {
                    continue;
                }
                let owned = args.new_owner().as_ref().is_some();
                if tx.send(owned).is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }
}
