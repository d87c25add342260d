// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::control::FakeControlClient;

use super::*;

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

#[tokio::test]
async fn becomes_valid_once_owner_present_and_enumerate_succeeds() {
    let fake = Arc::new(FakeControlClient::new());
    fake.set_available_sensor_plugins(vec!["proximitysensor".into()]);
    let service = Service::with_control(fake);

    wait_until(|| service.is_valid()).await;
    assert_eq!(service.available_sensors(), vec!["proximitysensor"]);
}

#[tokio::test]
async fn drops_to_invalid_when_name_owner_disappears() {
    let fake = Arc::new(FakeControlClient::new());
    fake.set_available_sensor_plugins(vec!["proximitysensor".into()]);
    let service = Service::with_control(fake.clone());
    wait_until(|| service.is_valid()).await;

    fake.set_service_owned(false);
    wait_until(|| !service.is_valid()).await;
    assert!(service.available_sensors().is_empty());
}

#[tokio::test]
async fn valid_changed_fires_on_transition() {
    let fake = Arc::new(FakeControlClient::new());
    let service = Service::with_control(fake);

    let seen = Arc::new(AtomicBool::new(false));
    let seen_clone = Arc::clone(&seen);
    service.add_valid_changed(move |v| {
        if v {
            seen_clone.store(true, Ordering::SeqCst);
        }
    });

    wait_until(|| seen.load(Ordering::SeqCst)).await;
}

#[tokio::test]
async fn enumerate_retries_after_failure() {
    tokio::time::pause();

    let fake = Arc::new(FakeControlClient::new());
    fake.fail_available_sensor_plugins("daemon busy");
    let service = Service::with_control(fake.clone());

    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    assert!(!service.is_valid());

    fake.clear_available_sensor_plugins_failure();
    fake.set_available_sensor_plugins(vec!["alssensor".into()]);
    tokio::time::advance(RETRY_DELAY).await;

    wait_until(|| service.is_valid()).await;
}
