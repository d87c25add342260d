// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[test]
fn subscribers_receive_emitted_values() {
    let signal: Signal<bool> = Signal::new();
    let seen = Arc::new(AtomicU32::new(0));
    let seen_clone = seen.clone();
    signal.subscribe(move |v| {
        if v {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        }
    });
    signal.emit(true);
    signal.emit(false);
    signal.emit(true);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn unsubscribed_handler_stops_receiving() {
    let signal: Signal<i32> = Signal::new();
    let seen = Arc::new(AtomicU32::new(0));
    let seen_clone = seen.clone();
    let id = signal.subscribe(move |_| {
        seen_clone.fetch_add(1, Ordering::SeqCst);
    });
    signal.emit(1);
    signal.unsubscribe(id);
    signal.emit(2);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn multiple_subscribers_all_observe_the_same_emission() {
    let signal: Signal<i32> = Signal::new();
    let a = Arc::new(AtomicU32::new(0));
    let b = Arc::new(AtomicU32::new(0));
    let (a2, b2) = (a.clone(), b.clone());
    signal.subscribe(move |_| {
        a2.fetch_add(1, Ordering::SeqCst);
    });
    signal.subscribe(move |_| {
        b2.fetch_add(1, Ordering::SeqCst);
    });
    signal.emit(0);
    assert_eq!(a.load(Ordering::SeqCst), 1);
    assert_eq!(b.load(Ordering::SeqCst), 1);
}

#[test]
fn emit_with_no_subscribers_is_a_no_op() {
    let signal: Signal<i32> = Signal::new();
    signal.emit(42);
}
