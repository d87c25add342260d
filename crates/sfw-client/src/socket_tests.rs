// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sfw_core::Reading;
use tokio::io::AsyncWriteExt as _;

#[tokio::test]
async fn handshake_succeeds_on_matching_ack() {
    let (mut client, mut daemon) = tokio::io::duplex(64);

    let daemon_task = tokio::spawn(async move {
        let mut id_buf = [0u8; 4];
        daemon.read_exact(&mut id_buf).await.unwrap();
        assert_eq!(i32::from_le_bytes(id_buf), 42);
        daemon.write_all(&[HANDSHAKE_ACK]).await.unwrap();
        daemon
    });

    handshake(&mut client, SessionId::new(42)).await.unwrap();
    daemon_task.await.unwrap();
}

#[tokio::test]
async fn handshake_fails_on_unexpected_ack_byte() {
    let (mut client, mut daemon) = tokio::io::duplex(64);

    tokio::spawn(async move {
        let mut id_buf = [0u8; 4];
        daemon.read_exact(&mut id_buf).await.unwrap();
        daemon.write_all(&[b'X']).await.unwrap();
    });

    let err = handshake(&mut client, SessionId::new(1)).await.unwrap_err();
    assert!(matches!(err, SocketError::HandshakeRejected(b'X')));
}

#[tokio::test]
async fn read_frame_decodes_a_single_proximity_sample() {
    let (mut client, mut daemon) = tokio::io::duplex(128);

    tokio::spawn(async move {
        let mut frame = Vec::new();
        frame.extend_from_slice(&1u32.to_le_bytes());
        frame.extend_from_slice(&1000u64.to_le_bytes());
        frame.extend_from_slice(&5u32.to_le_bytes());
        frame.push(1);
        daemon.write_all(&frame).await.unwrap();
    });

    let readings = read_frame(&mut client, SensorKind::Proximity).await.unwrap();
    assert_eq!(readings.len(), 1);
    match &readings[0] {
        Reading::Proximity(p) => {
            assert_eq!(p.timestamp, 1000);
            assert_eq!(p.distance, 5);
            assert!(p.is_near());
        }
        other => panic!("unexpected reading: {other:?}"),
    }
}

#[tokio::test]
async fn read_frame_rejects_out_of_range_count() {
    let (mut client, mut daemon) = tokio::io::duplex(64);

    tokio::spawn(async move {
        daemon.write_all(&17u32.to_le_bytes()).await.unwrap();
    });

    let err = read_frame(&mut client, SensorKind::Proximity).await.unwrap_err();
    assert!(matches!(err, SocketError::Decode(DecodeError::InvalidCount(17))));
}

#[tokio::test]
async fn read_frame_surfaces_io_error_on_early_close() {
    let (mut client, daemon) = tokio::io::duplex(64);
    drop(daemon);

    let err = read_frame(&mut client, SensorKind::Proximity).await.unwrap_err();
    assert!(matches!(err, SocketError::Io(_)));
}
