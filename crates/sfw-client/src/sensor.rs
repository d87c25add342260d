// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bottom tier: session + properties + socket handshake + sample
//! dispatch for one sensor kind.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use sfw_core::{CancelSlot, Reading, SensorKind, SessionId, Signal, SubscriptionId, Ticket};
use tokio::sync::Notify;
use tracing::{debug, warn};
use zbus::zvariant::OwnedValue;

use crate::config::RETRY_DELAY;
use crate::control::ControlClient;
use crate::plugin::Plugin;
use crate::reporting::Reporting;
use crate::socket::{handshake, read_frame, DuplexStream, SocketConnector, UnixSocketConnector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SensorState {
    Initial,
    Disabled,
    Session,
    Properties,
    Connect,
    Ready,
    Failed,
    Final,
}

struct Inner {
    state: SensorState,
    session_id: SessionId,
    properties: HashMap<String, OwnedValue>,
    valid: bool,
    reading: Option<Reading>,
}

pub struct Sensor {
    kind: SensorKind,
    plugin: Arc<Plugin>,
    socket_connector: Arc<dyn SocketConnector>,
    inner: Mutex<Inner>,
    valid_changed: Signal<bool>,
    reading_changed: Signal<Reading>,
    establish_cancel: CancelSlot,
    io_cancel: CancelSlot,
    io_close: Notify,
    reporting: Arc<Reporting>,
    plugin_sub: Mutex<Option<SubscriptionId>>,
}

impl Sensor {
    pub fn new(kind: SensorKind, plugin: Arc<Plugin>) -> Arc<Sensor> {
        Self::with_socket_connector(kind, plugin, Arc::new(UnixSocketConnector))
    }

    /// Construct with an injected [`SocketConnector`], so tests substitute
    /// a `tokio::io::duplex` pair for the real Unix socket.
    pub fn with_socket_connector(
        kind: SensorKind,
        plugin: Arc<Plugin>,
        socket_connector: Arc<dyn SocketConnector>,
    ) -> Arc<Sensor> {
        let sensor = Arc::new_cyclic(|weak_self| Sensor {
            kind,
            plugin: Arc::clone(&plugin),
            socket_connector,
            inner: Mutex::new(Inner {
                state: SensorState::Initial,
                session_id: SessionId::default(),
                properties: HashMap::new(),
                valid: false,
                reading: None,
            }),
            valid_changed: Signal::new(),
            reading_changed: Signal::new(),
            establish_cancel: CancelSlot::new(),
            io_cancel: CancelSlot::new(),
            io_close: Notify::new(),
            reporting: Reporting::new(weak_self.clone()),
            plugin_sub: Mutex::new(None),
        });

        let weak = Arc::downgrade(&sensor);
        let sub_id = plugin.add_valid_changed(move |plugin_valid| {
            if let Some(sensor) = weak.upgrade() {
                sensor.on_plugin_valid_changed(plugin_valid);
            }
        });
        *sensor.plugin_sub.lock() = Some(sub_id);

        if plugin.is_valid() {
            sensor.enter_session();
        } else {
            sensor.inner.lock().state = SensorState::Disabled;
        }

        sensor
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.sensor_name()
    }

    pub fn object_path(&self) -> String {
        self.kind.object_path()
    }

    pub fn interface_name(&self) -> &'static str {
        self.kind.interface_name()
    }

    pub fn session_id(&self) -> SessionId {
        self.inner.lock().session_id
    }

    pub fn property(&self, key: &str) -> Option<OwnedValue> {
        self.inner.lock().properties.get(key).cloned()
    }

    pub fn reading(&self) -> Option<Reading> {
        self.inner.lock().reading
    }

    pub fn is_valid(&self) -> bool {
        self.inner.lock().valid
    }

    pub fn is_active(&self) -> bool {
        self.reporting.is_active()
    }

    pub fn add_valid_changed(&self, handler: impl Fn(bool) + Send + 'static) -> SubscriptionId {
        self.valid_changed.subscribe(handler)
    }

    pub fn remove_valid_changed(&self, id: SubscriptionId) {
        self.valid_changed.unsubscribe(id);
    }

    pub fn add_active_changed(&self, handler: impl Fn(bool) + Send + 'static) -> SubscriptionId {
        self.reporting.add_active_changed(handler)
    }

    pub fn remove_active_changed(&self, id: SubscriptionId) {
        self.reporting.remove_active_changed(id);
    }

    pub fn add_reading_changed(&self, handler: impl Fn(Reading) + Send + 'static) -> SubscriptionId {
        self.reading_changed.subscribe(handler)
    }

    pub fn remove_reading_changed(&self, id: SubscriptionId) {
        self.reading_changed.unsubscribe(id);
    }

    pub fn start(&self) {
        self.reporting.start();
    }

    pub fn stop(&self) {
        self.reporting.stop();
    }

    pub fn set_datarate(&self, hz: f64) {
        self.reporting.set_datarate(hz);
    }

    pub fn set_alwayson(&self, on: bool) {
        self.reporting.set_override(on);
    }

    pub(crate) fn control(&self) -> Arc<dyn ControlClient> {
        self.plugin.service().control()
    }

    fn on_plugin_valid_changed(self: &Arc<Self>, plugin_valid: bool) {
        if plugin_valid {
            self.enter_session();
        } else {
            self.enter_disabled();
        }
    }

    fn enter_disabled(self: &Arc<Self>) {
        let (should_release, session_id, was_valid) = {
            let mut inner = self.inner.lock();
            if inner.state == SensorState::Final {
                return;
            }
            let should_release = inner.session_id.is_valid();
            let session_id = inner.session_id;
            inner.state = SensorState::Disabled;
            inner.session_id = SessionId::default();
            inner.properties.clear();
            let was_valid = std::mem::replace(&mut inner.valid, false);
            (should_release, session_id, was_valid)
        };

        self.establish_cancel.cancel();
        self.io_cancel.cancel();
        self.io_close.notify_waiters();

        if was_valid {
            self.valid_changed.emit(false);
            self.reporting.on_sensor_valid_changed(false);
        }

        if should_release {
            let this = Arc::clone(self);
            tokio::spawn(async move { this.release_session(session_id).await });
        }
    }

    async fn release_session(self: Arc<Self>, session_id: SessionId) {
        let control = self.control();
        match control.release_sensor(self.kind.sensor_name(), session_id.raw()).await {
            Ok(true) => {}
            Ok(false) => warn!(kind = %self.kind, "releaseSensor returned false, clearing session locally anyway"),
            Err(err) => warn!(kind = %self.kind, error = %err, "releaseSensor failed, clearing session locally anyway"),
        }
    }

    fn enter_session(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock();
            if inner.state == SensorState::Final {
                return;
            }
            inner.state = SensorState::Session;
        }

        let ticket = self.establish_cancel.begin();
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_establish(ticket).await });
    }

    async fn run_establish(self: Arc<Self>, ticket: Ticket) {
        let control = self.control();
        let plugin_name = self.kind.sensor_name();

        let session_id = match control.request_sensor(plugin_name).await {
            Ok(raw) if SessionId::new(raw).is_valid() => SessionId::new(raw),
            Ok(_) => {
                warn!(kind = %self.kind, "requestSensor returned the invalid sentinel, retrying");
                return self.fail_and_retry(ticket).await;
            }
            Err(err) => {
                warn!(kind = %self.kind, error = %err, "requestSensor failed, retrying");
                return self.fail_and_retry(ticket).await;
            }
        };
        if !ticket.is_current() {
            return;
        }

        {
            let mut inner = self.inner.lock();
            if inner.state != SensorState::Session {
                return;
            }
            inner.session_id = session_id;
            inner.state = SensorState::Properties;
        }

        let properties = match control.get_all_properties(plugin_name).await {
            Ok(props) => props,
            Err(err) => {
                warn!(kind = %self.kind, error = %err, "GetAll failed, retrying");
                return self.fail_and_retry(ticket).await;
            }
        };
        if !ticket.is_current() {
            return;
        }

        {
            let mut inner = self.inner.lock();
            if inner.state != SensorState::Properties {
                return;
            }
            inner.properties = properties;
            inner.state = SensorState::Connect;
        }

        let mut stream = match self.socket_connector.connect().await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(kind = %self.kind, error = %err, "data socket connect failed, retrying");
                return self.fail_and_retry(ticket).await;
            }
        };
        if !ticket.is_current() {
            return;
        }

        if let Err(err) = handshake(stream.as_mut(), session_id).await {
            warn!(kind = %self.kind, error = %err, "socket handshake failed, retrying");
            return self.fail_and_retry(ticket).await;
        }
        if !ticket.is_current() {
            return;
        }

        let became_valid = {
            let mut inner = self.inner.lock();
            if inner.state != SensorState::Connect {
                return;
            }
            inner.state = SensorState::Ready;
            !std::mem::replace(&mut inner.valid, true)
        };
        if became_valid {
            self.valid_changed.emit(true);
            self.reporting.on_sensor_valid_changed(true);
        }

        let io_ticket = self.io_cancel.begin();
        let this = Arc::clone(&self);
        tokio::spawn(async move { this.run_read_loop(stream, io_ticket).await });
    }

    async fn fail_and_retry(self: Arc<Self>, ticket: Ticket) {
        {
            let mut inner = self.inner.lock();
            if inner.state == SensorState::Final {
                return;
            }
            inner.state = SensorState::Failed;
        }

        tokio::time::sleep(RETRY_DELAY).await;
        if ticket.is_current() {
            self.enter_session();
        }
    }

    async fn run_read_loop(self: Arc<Self>, mut stream: Box<dyn DuplexStream>, ticket: Ticket) {
        loop {
            if !ticket.is_current() {
                return;
            }

            let frame = tokio::select! {
                _ = self.io_close.notified() => return,
                result = read_frame(stream.as_mut(), self.kind) => result,
            };
            if !ticket.is_current() {
                return;
            }

            match frame {
                Ok(readings) => {
                    for reading in readings {
                        self.on_reading(reading);
                    }
                }
                Err(err) => {
                    warn!(kind = %self.kind, error = %err, "sample frame protocol violation");
                    drop(stream);
                    self.fail_from_ready_and_retry().await;
                    return;
                }
            }
        }
    }

    fn on_reading(self: &Arc<Self>, reading: Reading) {
        self.inner.lock().reading = Some(reading);

        if self.reporting.is_active() {
            self.reading_changed.emit(reading);
        } else {
            debug!(kind = %self.kind, "reading arrived while reporting inactive, discarding");
        }
    }

    async fn fail_from_ready_and_retry(self: Arc<Self>) {
        let was_valid = {
            let mut inner = self.inner.lock();
            if inner.state != SensorState::Ready {
                return;
            }
            inner.state = SensorState::Failed;
            std::mem::replace(&mut inner.valid, false)
        };
        if was_valid {
            self.valid_changed.emit(false);
            self.reporting.on_sensor_valid_changed(false);
        }

        let ticket = self.establish_cancel.begin();
        tokio::time::sleep(RETRY_DELAY).await;
        if ticket.is_current() {
            self.enter_session();
        }
    }
}

impl Drop for Sensor {
    fn drop(&mut self) {
        self.inner.lock().state = SensorState::Final;
        self.establish_cancel.cancel();
        self.io_cancel.cancel();
        self.io_close.notify_waiters();
        if let Some(id) = self.plugin_sub.lock().take() {
            self.plugin.remove_valid_changed(id);
        }
    }
}

#[cfg(test)]
#[path = "sensor_tests.rs"]
mod tests;
