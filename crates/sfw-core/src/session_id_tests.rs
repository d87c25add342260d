// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_is_invalid() {
    assert_eq!(SessionId::default(), SessionId::INVALID);
    assert!(!SessionId::default().is_valid());
}

#[test]
fn non_negative_session_is_valid() {
    assert!(SessionId::new(42).is_valid());
    assert_eq!(SessionId::new(42).raw(), 42);
}

#[test]
fn negative_one_is_the_invalid_sentinel() {
    assert_eq!(SessionId::new(-1), SessionId::INVALID);
    assert!(!SessionId::new(-1).is_valid());
}
