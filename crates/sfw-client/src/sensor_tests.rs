// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use sfw_core::SensorKind;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::control::{ControlCall, FakeControlClient};
use crate::plugin::Plugin;
use crate::service::Service;
use crate::socket::{DuplexStream, SocketConnector};

use super::*;

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..500 {
        if check() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

/// Hands out one pre-made duplex half per test, then fails every further
/// connection attempt (used to drive a single happy-path or a single
/// scripted failure).
struct OneShotConnector {
    stream: SyncMutex<Option<Box<dyn DuplexStream>>>,
}

impl OneShotConnector {
    fn new(stream: Box<dyn DuplexStream>) -> Arc<Self> {
        Arc::new(Self {
            stream: SyncMutex::new(Some(stream)),
        })
    }
}

#[async_trait]
impl SocketConnector for OneShotConnector {
    async fn connect(&self) -> std::io::Result<Box<dyn DuplexStream>> {
        self.stream
            .lock()
            .take()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "no more connections scripted"))
    }
}

struct AlwaysFailsConnector;

#[async_trait]
impl SocketConnector for AlwaysFailsConnector {
    async fn connect(&self) -> std::io::Result<Box<dyn DuplexStream>> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "connection refused"))
    }
}

async fn ready_plugin() -> (Arc<Plugin>, Arc<FakeControlClient>) {
    let fake = Arc::new(FakeControlClient::new());
    fake.set_available_sensor_plugins(vec!["proximitysensor".into()]);
    let service = Service::with_control(fake.clone());
    let plugin = Plugin::with_service(SensorKind::Proximity, service);
    wait_until(|| plugin.is_valid()).await;
    (plugin, fake)
}

#[tokio::test]
async fn becomes_ready_after_session_properties_and_handshake() {
    let (plugin, fake) = ready_plugin().await;
    let (client_half, mut daemon_half) = tokio::io::duplex(256);
    let connector = OneShotConnector::new(Box::new(client_half));

    tokio::spawn(async move {
        let mut session_id_buf = [0u8; 4];
        daemon_half.read_exact(&mut session_id_buf).await.unwrap();
        daemon_half.write_all(&[b'\n']).await.unwrap();
    });

    let sensor = Sensor::with_socket_connector(SensorKind::Proximity, plugin, connector);
    wait_until(|| sensor.is_valid()).await;

    assert!(fake
        .calls()
        .contains(&ControlCall::RequestSensor { plugin_name: "proximitysensor".into() }));
    assert!(fake.calls().iter().any(|c| matches!(
        c,
        ControlCall::GetAllProperties { plugin_name } if plugin_name == "proximitysensor"
    )));
}

#[tokio::test]
async fn session_id_is_recorded_from_request_sensor_reply() {
    let (plugin, _fake) = ready_plugin().await;
    let (client_half, mut daemon_half) = tokio::io::duplex(256);
    let connector = OneShotConnector::new(Box::new(client_half));

    let handshake_session_id = Arc::new(SyncMutex::new(None));
    let captured = Arc::clone(&handshake_session_id);
    tokio::spawn(async move {
        let mut buf = [0u8; 4];
        daemon_half.read_exact(&mut buf).await.unwrap();
        *captured.lock() = Some(i32::from_le_bytes(buf));
        daemon_half.write_all(&[b'\n']).await.unwrap();
    });

    let sensor = Sensor::with_socket_connector(SensorKind::Proximity, plugin, connector);
    wait_until(|| sensor.is_valid()).await;

    assert_eq!(sensor.session_id().raw(), handshake_session_id.lock().unwrap());
}

#[tokio::test]
async fn retries_after_socket_connect_fails() {
    tokio::time::pause();

    let (plugin, _fake) = ready_plugin().await;
    let sensor = Sensor::with_socket_connector(
        SensorKind::Proximity,
        plugin,
        Arc::new(AlwaysFailsConnector),
    );

    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    assert!(!sensor.is_valid());

    // Still won't succeed after the retry fires, since the connector
    // always fails, but the tier should still be alive and retrying
    // rather than stuck.
    tokio::time::advance(RETRY_DELAY).await;
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    assert!(!sensor.is_valid());
}

#[tokio::test]
async fn reading_changed_fires_once_reporting_is_active() {
    let (plugin, _fake) = ready_plugin().await;
    let (client_half, mut daemon_half) = tokio::io::duplex(4096);
    let connector = OneShotConnector::new(Box::new(client_half));

    tokio::spawn(async move {
        let mut session_id_buf = [0u8; 4];
        daemon_half.read_exact(&mut session_id_buf).await.unwrap();
        daemon_half.write_all(&[b'\n']).await.unwrap();

        // One proximity sample: timestamp=1000, distance=5, proximity=1.
        let mut frame = Vec::new();
        frame.extend_from_slice(&1u32.to_le_bytes());
        frame.extend_from_slice(&1000u64.to_le_bytes());
        frame.extend_from_slice(&5u32.to_le_bytes());
        frame.push(1);
        daemon_half.write_all(&frame).await.unwrap();

        // Keep the daemon half alive so the read loop doesn't see EOF
        // before the test has a chance to observe the reading.
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
    });

    let sensor = Sensor::with_socket_connector(SensorKind::Proximity, plugin, connector);
    wait_until(|| sensor.is_valid()).await;

    sensor.start();
    wait_until(|| sensor.is_active()).await;

    let last = Arc::new(SyncMutex::new(None));
    let captured = Arc::clone(&last);
    sensor.add_reading_changed(move |reading| {
        *captured.lock() = Some(reading);
    });

    wait_until(|| sensor.reading().is_some()).await;

    match sensor.reading().unwrap() {
        Reading::Proximity(p) => {
            assert_eq!(p.timestamp, 1000);
            assert_eq!(p.distance, 5);
            assert!(p.is_near());
        }
        other => panic!("expected a proximity reading, got {other:?}"),
    }
}

#[tokio::test]
async fn sensor_follows_plugin_back_to_disabled_on_owner_loss() {
    let (plugin, fake) = ready_plugin().await;
    let (client_half, mut daemon_half) = tokio::io::duplex(256);
    let connector = OneShotConnector::new(Box::new(client_half));

    tokio::spawn(async move {
        let mut buf = [0u8; 4];
        daemon_half.read_exact(&mut buf).await.unwrap();
        daemon_half.write_all(&[b'\n']).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
    });

    let sensor = Sensor::with_socket_connector(SensorKind::Proximity, plugin, connector);
    wait_until(|| sensor.is_valid()).await;

    fake.set_service_owned(false);
    wait_until(|| !sensor.is_valid()).await;

    assert!(fake.calls().iter().any(|c| matches!(
        c,
        ControlCall::ReleaseSensor { plugin_name, .. } if plugin_name == "proximitysensor"
    )));
}

#[tokio::test]
async fn out_of_range_frame_count_fails_the_connection() {
    let (plugin, _fake) = ready_plugin().await;
    let (client_half, mut daemon_half) = tokio::io::duplex(4096);
    let connector = OneShotConnector::new(Box::new(client_half));

    tokio::spawn(async move {
        let mut buf = [0u8; 4];
        daemon_half.read_exact(&mut buf).await.unwrap();
        daemon_half.write_all(&[b'\n']).await.unwrap();
        daemon_half.write_all(&17u32.to_le_bytes()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
    });

    let sensor = Sensor::with_socket_connector(SensorKind::Proximity, plugin, connector);
    wait_until(|| sensor.is_valid()).await;
    wait_until(|| !sensor.is_valid()).await;
}
