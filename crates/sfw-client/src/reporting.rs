// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The child tier: reconciles wanted/requested/effective triples for
//! {enable, data rate, stand-by override} against the daemon.
//!
//! Driven directly from `Sensor::on_sensor_valid_changed` via a plain
//! method call rather than a `Signal` subscription: a uniquely-owned
//! child doesn't need the subscribe/unsubscribe dance a shared-ownership
//! dependency does.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sfw_core::{CancelSlot, Signal, SubscriptionId, Ticket};
use tokio::sync::Notify;
use tracing::warn;

use crate::config::RETRY_DELAY;
use crate::sensor::Sensor;

const DEFAULT_DATARATE: f64 = 0.0;
const DEFAULT_STANDBY_OVERRIDE: bool = false;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportingState {
    Initial,
    Disabled,
    Rethink,
    Starting,
    Configure,
    Started,
    Stopping,
    Stopped,
    Failed,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Triple {
    enable: bool,
    datarate: f64,
    standby_override: bool,
}

impl Default for Triple {
    fn default() -> Self {
        Triple {
            enable: false,
            datarate: DEFAULT_DATARATE,
            standby_override: DEFAULT_STANDBY_OVERRIDE,
        }
    }
}

struct Inner {
    state: ReportingState,
    wanted: Triple,
    requested: Triple,
    effective: Triple,
    valid: bool,
    active: bool,
}

pub struct Reporting {
    sensor: Weak<Sensor>,
    inner: Mutex<Inner>,
    valid_changed: Signal<bool>,
    active_changed: Signal<bool>,
    cancel: CancelSlot,
    dirty: Notify,
    shutdown: Notify,
}

impl Reporting {
    pub(crate) fn new(sensor: Weak<Sensor>) -> Arc<Reporting> {
        Arc::new(Reporting {
            sensor,
            inner: Mutex::new(Inner {
                state: ReportingState::Initial,
                wanted: Triple::default(),
                requested: Triple::default(),
                effective: Triple::default(),
                valid: false,
                active: false,
            }),
            valid_changed: Signal::new(),
            active_changed: Signal::new(),
            cancel: CancelSlot::new(),
            dirty: Notify::new(),
            shutdown: Notify::new(),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.inner.lock().valid
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().active
    }

    pub fn is_started(&self) -> bool {
        self.inner.lock().state == ReportingState::Started
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.lock().state == ReportingState::Stopped
    }

    pub fn add_valid_changed(&self, handler: impl Fn(bool) + Send + 'static) -> SubscriptionId {
        self.valid_changed.subscribe(handler)
    }

    pub fn remove_valid_changed(&self, id: SubscriptionId) {
        self.valid_changed.unsubscribe(id);
    }

    pub fn add_active_changed(&self, handler: impl Fn(bool) + Send + 'static) -> SubscriptionId {
        self.active_changed.subscribe(handler)
    }

    pub fn remove_active_changed(&self, id: SubscriptionId) {
        self.active_changed.unsubscribe(id);
    }

    pub fn start(&self) {
        self.inner.lock().wanted.enable = true;
        self.dirty.notify_one();
    }

    pub fn stop(&self) {
        self.inner.lock().wanted.enable = false;
        self.dirty.notify_one();
    }

    pub fn set_datarate(&self, hz: f64) {
        self.inner.lock().wanted.datarate = hz;
        self.dirty.notify_one();
    }

    /// Equivalent to `set_datarate(1e6 / us)`, or `set_datarate(0)` if
    /// `us <= 0`.
    pub fn set_interval(&self, us: f64) {
        self.set_datarate(if us > 0.0 { 1e6 / us } else { 0.0 });
    }

    pub fn set_override(&self, on: bool) {
        self.inner.lock().wanted.standby_override = on;
        self.dirty.notify_one();
    }

    pub(crate) fn on_sensor_valid_changed(self: &Arc<Self>, sensor_valid: bool) {
        if sensor_valid {
            self.enter_rethink();
        } else {
            self.enter_disabled();
        }
    }

    fn enter_disabled(self: &Arc<Self>) {
        let (was_valid, was_active) = {
            let mut inner = self.inner.lock();
            if inner.state == ReportingState::Final {
                return (false, false);
            }
            inner.state = ReportingState::Disabled;
            inner.requested = Triple::default();
            inner.effective = Triple::default();
            let was_active = std::mem::replace(&mut inner.active, false);
            let was_valid = std::mem::replace(&mut inner.valid, false);
            (was_valid, was_active)
        };

        self.cancel.cancel();
        self.shutdown.notify_waiters();

        if was_active {
            self.active_changed.emit(false);
        }
        if was_valid {
            self.valid_changed.emit(false);
        }
    }

    fn enter_rethink(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock();
            if inner.state == ReportingState::Final {
                return;
            }
            inner.state = ReportingState::Rethink;
        }

        let ticket = self.cancel.begin();
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run(ticket).await });
    }

    async fn run(self: Arc<Self>, ticket: Ticket) {
        loop {
            if !ticket.is_current() {
                return;
            }

            // `valid` only holds in the settled `Started`/`Stopped` states;
            // every pass through `Rethink` drops it until `run_starting`/
            // `run_stopping` re-establishes it on success.
            let (became_invalid, requested) = {
                let mut inner = self.inner.lock();
                if inner.state == ReportingState::Final {
                    return;
                }
                inner.state = ReportingState::Rethink;
                inner.requested = inner.wanted;
                let became_invalid = std::mem::replace(&mut inner.valid, false);
                (became_invalid, inner.requested)
            };
            if became_invalid {
                self.valid_changed.emit(false);
            }

            let proceed = if requested.enable {
                self.run_starting(&ticket, requested).await
            } else {
                self.run_stopping(&ticket, requested).await
            };
            if !proceed {
                return;
            }
        }
    }

    /// Drives `Starting` → `Configure` → `Started`, then waits for the
    /// next divergence or shutdown. Returns `false` when the caller
    /// should stop looping (cancelled or final).
    async fn run_starting(self: &Arc<Self>, ticket: &Ticket, requested: Triple) -> bool {
        let Some(sensor) = self.sensor.upgrade() else {
            return false;
        };

        self.inner.lock().state = ReportingState::Starting;
        let effective_enable = self.inner.lock().effective.enable;
        if requested.enable != effective_enable {
            match sensor.control().start(sensor.name(), sensor.session_id().raw()).await {
                Ok(()) => self.inner.lock().effective.enable = true,
                Err(err) => {
                    warn!(kind = %sensor.kind(), error = %err, "start failed, retrying");
                    return self.fail_and_retry(ticket).await;
                }
            }
        }
        if !ticket.is_current() {
            return false;
        }

        self.inner.lock().state = ReportingState::Configure;
        let effective = self.inner.lock().effective;
        let need_datarate = requested.datarate != effective.datarate;
        let need_override = requested.standby_override != effective.standby_override;

        if need_datarate || need_override {
            let control = sensor.control();
            let session_id = sensor.session_id().raw();
            let (datarate_result, override_result) = tokio::join!(
                async {
                    if need_datarate {
                        Some(control.set_data_rate(sensor.name(), session_id, requested.datarate).await)
                    } else {
                        None
                    }
                },
                async {
                    if need_override {
                        Some(control.set_standby_override(sensor.name(), session_id, requested.standby_override).await)
                    } else {
                        None
                    }
                },
            );

            if let Some(result) = datarate_result {
                match result {
                    Ok(()) => self.inner.lock().effective.datarate = requested.datarate,
                    Err(err) => {
                        warn!(kind = %sensor.kind(), error = %err, "setDataRate failed, retrying");
                        return self.fail_and_retry(ticket).await;
                    }
                }
            }

            if let Some(result) = override_result {
                match result {
                    Ok(_applied) => {}
                    Err(err) => {
                        warn!(kind = %sensor.kind(), error = %err, "setStandbyOverride rejected, tolerating");
                    }
                }
                // Tolerated either way: the daemon may simply lack support.
                self.inner.lock().effective.standby_override = requested.standby_override;
            }
        }
        if !ticket.is_current() {
            return false;
        }

        let (became_valid, became_active) = {
            let mut inner = self.inner.lock();
            inner.state = ReportingState::Started;
            let became_valid = !std::mem::replace(&mut inner.valid, true);
            let became_active = !std::mem::replace(&mut inner.active, true);
            (became_valid, became_active)
        };
        if became_valid {
            self.valid_changed.emit(true);
        }
        if became_active {
            self.active_changed.emit(true);
        }

        tokio::select! {
            _ = self.dirty.notified() => true,
            _ = self.shutdown.notified() => false,
        }
    }

    /// Drives `Stopping` → `Stopped`, then waits for the next divergence
    /// (typically a subsequent `start()`) or shutdown.
    async fn run_stopping(self: &Arc<Self>, ticket: &Ticket, requested: Triple) -> bool {
        let Some(sensor) = self.sensor.upgrade() else {
            return false;
        };

        self.inner.lock().state = ReportingState::Stopping;
        let effective_enable = self.inner.lock().effective.enable;
        if requested.enable != effective_enable {
            match sensor.control().stop(sensor.name(), sensor.session_id().raw()).await {
                Ok(()) => self.inner.lock().effective.enable = false,
                Err(err) => {
                    warn!(kind = %sensor.kind(), error = %err, "stop failed, retrying");
                    return self.fail_and_retry(ticket).await;
                }
            }
        }
        if !ticket.is_current() {
            return false;
        }

        let (became_valid, became_inactive) = {
            let mut inner = self.inner.lock();
            inner.effective.datarate = DEFAULT_DATARATE;
            inner.effective.standby_override = DEFAULT_STANDBY_OVERRIDE;
            inner.state = ReportingState::Stopped;
            let became_valid = !std::mem::replace(&mut inner.valid, true);
            let became_inactive = std::mem::replace(&mut inner.active, false);
            (became_valid, became_inactive)
        };
        if became_valid {
            self.valid_changed.emit(true);
        }
        if became_inactive {
            self.active_changed.emit(false);
        }

        tokio::select! {
            _ = self.dirty.notified() => true,
            _ = self.shutdown.notified() => false,
        }
    }

    async fn fail_and_retry(self: &Arc<Self>, ticket: &Ticket) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.state == ReportingState::Final {
                return false;
            }
            inner.state = ReportingState::Failed;
        }

        tokio::time::sleep(RETRY_DELAY).await;
        ticket.is_current()
    }
}

impl Drop for Reporting {
    fn drop(&mut self) {
        self.inner.lock().state = ReportingState::Final;
        self.cancel.cancel();
        self.shutdown.notify_waiters();
    }
}

#[cfg(test)]
#[path = "reporting_tests.rs"]
mod tests;
