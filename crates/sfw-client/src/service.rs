// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The top tier: "is the daemon reachable right now".

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sfw_core::{CancelSlot, Signal, SubscriptionId, Ticket};
use tracing::warn;

use crate::config::RETRY_DELAY;
use crate::control::{ControlClient, ControlError, ZbusControlClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceState {
    Initial,
    Disabled,
    Enumerating,
    Ready,
    Failed,
    Final,
}

struct Inner {
    state: ServiceState,
    available_sensors: Vec<String>,
    valid: bool,
}

/// Process-wide weak singleton: alive while at least one `Arc<Service>` is
/// held, rebuilt from scratch on the next [`Service::connect`] after the
/// last one drops.
static INSTANCE: Mutex<Weak<Service>> = Mutex::new(Weak::new());

pub struct Service {
    control: Arc<dyn ControlClient>,
    inner: Mutex<Inner>,
    valid_changed: Signal<bool>,
    enumerate_cancel: CancelSlot,
}

impl Service {
    /// Production entry point: reuses the live singleton if one exists,
    /// otherwise dials the system bus and constructs a fresh `Service`.
    pub async fn connect() -> Result<Arc<Service>, ControlError> {
        if let Some(existing) = INSTANCE.lock().upgrade() {
            return Ok(existing);
        }
        let service = Self::with_control(Arc::new(ZbusControlClient::connect().await?));
        *INSTANCE.lock() = Arc::downgrade(&service);
        Ok(service)
    }

    /// Construct directly from a [`ControlClient`], bypassing the global
    /// singleton slot. Used by tests (with a `FakeControlClient`) so
    /// concurrently-running tests never contend on the shared static.
    pub fn with_control(control: Arc<dyn ControlClient>) -> Arc<Service> {
        let service = Arc::new(Service {
            control,
            inner: Mutex::new(Inner {
                state: ServiceState::Initial,
                available_sensors: Vec::new(),
                valid: false,
            }),
            valid_changed: Signal::new(),
            enumerate_cancel: CancelSlot::new(),
        });

        let weak = Arc::downgrade(&service);
        tokio::spawn(Service::run(weak));

        service
    }

    pub fn is_valid(&self) -> bool {
        self.inner.lock().valid
    }

    /// The daemon's current enumerated sensor plugin name set.
    pub fn available_sensors(&self) -> Vec<String> {
        self.inner.lock().available_sensors.clone()
    }

    pub fn add_valid_changed(&self, handler: impl Fn(bool) + Send + 'static) -> SubscriptionId {
        self.valid_changed.subscribe(handler)
    }

    pub fn remove_valid_changed(&self, id: SubscriptionId) {
        self.valid_changed.unsubscribe(id);
    }

    /// The shared control-plane connection backing this `Service`. Public
    /// so callers that need to issue their own manager-level calls don't
    /// have to go through a sensor kind to reach it.
    pub fn connection(&self) -> Arc<dyn ControlClient> {
        Arc::clone(&self.control)
    }

    pub(crate) fn control(&self) -> Arc<dyn ControlClient> {
        self.connection()
    }

    async fn run(weak: Weak<Service>) {
        loop {
            let Some(service) = weak.upgrade() else { return };
            let control = Arc::clone(&service.control);
            drop(service);

            let mut owner_rx = match control.watch_service_owner().await {
                Ok(rx) => rx,
                Err(err) => {
                    warn!(error = %err, "failed to watch service bus name, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            loop {
                let Some(service) = weak.upgrade() else { return };
                let owned = *owner_rx.borrow();
                if owned {
                    service.enter_enumerating();
                } else {
                    service.enter_disabled();
                }
                drop(service);

                if owner_rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    fn enter_disabled(self: &Arc<Self>) {
        let mut inner = self.inner.lock();
        if inner.state == ServiceState::Final {
            return;
        }
        inner.state = ServiceState::Disabled;
        inner.available_sensors.clear();
        let was_valid = std::mem::replace(&mut inner.valid, false);
        drop(inner);

        self.enumerate_cancel.cancel();
        if was_valid {
            self.valid_changed.emit(false);
        }
    }

    fn enter_enumerating(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock();
            if inner.state == ServiceState::Final {
                return;
            }
            inner.state = ServiceState::Enumerating;
        }

        let ticket = self.enumerate_cancel.begin();
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_enumerate(ticket).await });
    }

    async fn run_enumerate(self: Arc<Self>, ticket: Ticket) {
        match self.control.available_sensor_plugins().await {
            Ok(sensors) => {
                if !ticket.is_current() {
                    return;
                }
                let became_valid = {
                    let mut inner = self.inner.lock();
                    if inner.state != ServiceState::Enumerating {
                        return;
                    }
                    inner.available_sensors = sensors;
                    inner.state = ServiceState::Ready;
                    !std::mem::replace(&mut inner.valid, true)
                };
                if became_valid {
                    self.valid_changed.emit(true);
                }
            }
            Err(err) => {
                if !ticket.is_current() {
                    return;
                }
                warn!(error = %err, "availableSensorPlugins failed, retrying");
                {
                    let mut inner = self.inner.lock();
                    if inner.state != ServiceState::Enumerating {
                        return;
                    }
                    inner.state = ServiceState::Failed;
                }

                tokio::time::sleep(RETRY_DELAY).await;
                if ticket.is_current() {
                    self.enter_enumerating();
                }
            }
        }
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        self.inner.lock().state = ServiceState::Final;
        self.enumerate_cancel.cancel();
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
