// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The middle tier: ensures the daemon has loaded the sensor plugin for
//! one [`SensorKind`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use sfw_core::{CancelSlot, SensorKind, Signal, SubscriptionId, Ticket};
use tracing::warn;

use crate::config::RETRY_DELAY;
use crate::service::Service;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PluginState {
    Initial,
    Disabled,
    Loading,
    Ready,
    Failed,
    Final,
}

struct Inner {
    state: PluginState,
    valid: bool,
}

fn instances() -> &'static Mutex<HashMap<SensorKind, Weak<Plugin>>> {
    static INSTANCES: OnceLock<Mutex<HashMap<SensorKind, Weak<Plugin>>>> = OnceLock::new();
    INSTANCES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// One shared instance per [`SensorKind`]; weak singleton like [`Service`],
/// keyed this time rather than global.
pub struct Plugin {
    kind: SensorKind,
    service: Arc<Service>,
    inner: Mutex<Inner>,
    valid_changed: Signal<bool>,
    load_cancel: CancelSlot,
    service_sub: Mutex<Option<SubscriptionId>>,
}

impl Plugin {
    pub fn instance(kind: SensorKind, service: Arc<Service>) -> Arc<Plugin> {
        let mut map = instances().lock();
        if let Some(existing) = map.get(&kind).and_then(Weak::upgrade) {
            return existing;
        }
        let plugin = Self::with_service(kind, service);
        map.insert(kind, Arc::downgrade(&plugin));
        plugin
    }

    /// Construct directly, bypassing the per-kind singleton map. Used by
    /// tests so each test gets an isolated `Plugin` regardless of what
    /// other tests registered for the same kind.
    pub fn with_service(kind: SensorKind, service: Arc<Service>) -> Arc<Plugin> {
        let plugin = Arc::new(Plugin {
            kind,
            service: Arc::clone(&service),
            inner: Mutex::new(Inner {
                state: PluginState::Initial,
                valid: false,
            }),
            valid_changed: Signal::new(),
            load_cancel: CancelSlot::new(),
            service_sub: Mutex::new(None),
        });

        let weak = Arc::downgrade(&plugin);
        let sub_id = service.add_valid_changed(move |service_valid| {
            if let Some(plugin) = weak.upgrade() {
                plugin.on_service_valid_changed(service_valid);
            }
        });
        *plugin.service_sub.lock() = Some(sub_id);

        if service.is_valid() {
            plugin.enter_loading();
        } else {
            plugin.inner.lock().state = PluginState::Disabled;
        }

        plugin
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

    pub fn service(&self) -> Arc<Service> {
        Arc::clone(&self.service)
    }

    pub fn is_valid(&self) -> bool {
        self.inner.lock().valid
    }

    pub fn add_valid_changed(&self, handler: impl Fn(bool) + Send + 'static) -> SubscriptionId {
        self.valid_changed.subscribe(handler)
    }

    pub fn remove_valid_changed(&self, id: SubscriptionId) {
        self.valid_changed.unsubscribe(id);
    }

    fn on_service_valid_changed(self: &Arc<Self>, service_valid: bool) {
        if service_valid {
            self.enter_loading();
        } else {
            self.enter_disabled();
        }
    }

    fn enter_disabled(self: &Arc<Self>) {
        let mut inner = self.inner.lock();
        if inner.state == PluginState::Final {
            return;
        }
        inner.state = PluginState::Disabled;
        let was_valid = std::mem::replace(&mut inner.valid, false);
        drop(inner);

        self.load_cancel.cancel();
        if was_valid {
            self.valid_changed.emit(false);
        }
    }

    fn enter_loading(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock();
            if inner.state == PluginState::Final {
                return;
            }
            inner.state = PluginState::Loading;
        }

        let ticket = self.load_cancel.begin();
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_load(ticket).await });
    }

    async fn run_load(self: Arc<Self>, ticket: Ticket) {
        let result = self.service.control().load_plugin(self.kind.sensor_name()).await;
        match result {
            Ok(true) => {
                if !ticket.is_current() {
                    return;
                }
                let became_valid = {
                    let mut inner = self.inner.lock();
                    if inner.state != PluginState::Loading {
                        return;
                    }
                    inner.state = PluginState::Ready;
                    !std::mem::replace(&mut inner.valid, true)
                };
                if became_valid {
                    self.valid_changed.emit(true);
                }
            }
            Ok(false) => {
                if !ticket.is_current() {
                    return;
                }
                warn!(kind = %self.kind, "loadPlugin reply was false, retrying");
                self.fail_and_retry(ticket).await;
            }
            Err(err) => {
                if !ticket.is_current() {
                    return;
                }
                warn!(kind = %self.kind, error = %err, "loadPlugin call failed, retrying");
                self.fail_and_retry(ticket).await;
            }
        }
    }

    async fn fail_and_retry(self: Arc<Self>, ticket: Ticket) {
        {
            let mut inner = self.inner.lock();
            if inner.state != PluginState::Loading {
                return;
            }
            inner.state = PluginState::Failed;
        }

        tokio::time::sleep(RETRY_DELAY).await;
        if ticket.is_current() {
            self.enter_loading();
        }
    }
}

impl Drop for Plugin {
    fn drop(&mut self) {
        self.inner.lock().state = PluginState::Final;
        if let Some(id) = self.service_sub.lock().take() {
            self.service.remove_valid_changed(id);
        }
        self.load_cancel.cancel();
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
