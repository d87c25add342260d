// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-socket transport: connecting, the session-id handshake, and the
//! length-prefixed sample-frame reader.
//!
//! Reading logic is generic over [`AsyncRead`]/[`AsyncWrite`] rather than
//! tied to [`tokio::net::UnixStream`], so tests substitute a
//! `tokio::io::duplex` pair instead of a bespoke fake socket type.

use async_trait::async_trait;
use sfw_core::{decode_frame, validate_count, DecodeError, Reading, SensorKind, SessionId};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;

use crate::config::{DATA_SOCKET_PATH, HANDSHAKE_ACK};

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("socket io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("handshake rejected: expected ack byte, got {0:#04x}")]
    HandshakeRejected(u8),
}

/// A socket half generic enough to be either a real Unix stream or a
/// `tokio::io::duplex` test pair.
pub trait DuplexStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> DuplexStream for T {}

/// Opens the data-channel transport. Abstracted so tests can hand back
/// an in-memory duplex pair instead of dialing a real socket.
#[async_trait]
pub trait SocketConnector: Send + Sync + 'static {
    async fn connect(&self) -> std::io::Result<Box<dyn DuplexStream>>;
}

/// Real connector: dials the fixed Unix domain socket path.
pub struct UnixSocketConnector;

#[async_trait]
impl SocketConnector for UnixSocketConnector {
    async fn connect(&self) -> std::io::Result<Box<dyn DuplexStream>> {
        let stream = UnixStream::connect(DATA_SOCKET_PATH).await?;
        Ok(Box::new(stream))
    }
}

/// Send the 4-byte little-endian session id and await the single-byte
/// ack. The caller switches the socket to blocking reads
/// for the sample loop afterwards — tokio sockets are always
/// non-blocking at the OS level, so "blocking mode" here just means
/// "now we `read_exact` instead of polling an edge-triggered watch".
pub async fn handshake(
    stream: &mut (dyn DuplexStream),
    session_id: SessionId,
) -> Result<(), SocketError> {
    stream.write_all(&session_id.raw().to_le_bytes()).await?;
    stream.flush().await?;

    let mut ack = [0u8; 1];
    stream.read_exact(&mut ack).await?;
    if ack[0] != HANDSHAKE_ACK {
        return Err(SocketError::HandshakeRejected(ack[0]));
    }
    Ok(())
}

/// Read one length-prefixed frame and decode+normalize every sample in
/// it. A count outside `1..=16` or a short read is a
/// protocol violation, surfaced as [`SocketError`] so the caller can
/// close the socket and move the tier to `Failed`.
pub async fn read_frame(
    stream: &mut (dyn DuplexStream),
    kind: SensorKind,
) -> Result<Vec<Reading>, SocketError> {
    let mut count_buf = [0u8; 4];
    stream.read_exact(&mut count_buf).await?;
    let count = u32::from_le_bytes(count_buf);
    validate_count(count)?;

    let mut buf = vec![0u8; kind.wire_sample_size() * count as usize];
    stream.read_exact(&mut buf).await?;
    Ok(decode_frame(kind, count, &buf)?)
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
