// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sfw-client: a client-side library mediating between applications and
//! a system sensor daemon over D-Bus (control) and a Unix domain socket
//! (binary sample stream).
//!
//! The core is a three-tier cooperative state-machine pipeline —
//! [`Service`] ↔ [`Plugin`] ↔ [`Sensor`] — plus the [`Reporting`] child
//! that reconciles enable/data-rate/stand-by-override against the
//! daemon, and the stateless sample decoder in `sfw-core`. Each tier
//! exposes `valid`/`active` observables rather than surfacing errors
//! synchronously: failures recover locally through a uniform 5-second
//! retry and are visible only through those observables and log records.

pub mod config;
pub mod control;
pub mod plugin;
pub mod reporting;
pub mod sensor;
pub mod service;
pub mod socket;

pub use control::{ControlClient, ControlError, ZbusControlClient};
pub use plugin::Plugin;
pub use reporting::Reporting;
pub use sensor::Sensor;
pub use service::Service;
pub use socket::{DuplexStream, SocketConnector, SocketError, UnixSocketConnector};

pub use sfw_core::{Reading, SensorKind, SessionId, SubscriptionId};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use control::{ControlCall, FakeControlClient};
