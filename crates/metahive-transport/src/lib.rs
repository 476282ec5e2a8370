//! Transport layer for MetaHive.
//!
//! The presence core never touches sockets. This crate provides the
//! [`Transport`] and [`Connection`] traits the server's connection handler
//! is written against, plus a WebSocket implementation that browser clients
//! talk to directly.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

/// Process-unique handle for one client connection, shown as `conn-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of new client connections.
///
/// The server's accept loop is written against this trait, not against a
/// socket type. [`accept`](Self::accept) resolves only once a connection is
/// ready for frames, so any handshake (the WebSocket upgrade here) happens
/// inside the transport.
///
/// Implementations are `Send + Sync + 'static` because the server owns the
/// transport for as long as it runs, possibly on any runtime thread.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Resolves once the next client has connected and finished any
    /// protocol upgrade.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}

/// A connected client exchanging whole frames.
///
/// A frame is one complete payload: one JSON message for MetaHive.
/// Implementations deal with framing, control frames and partial reads,
/// and callers only ever see whole payloads.
///
/// ## Concurrency
///
/// All methods take `&self`. The connection handler polls `recv` inside a
/// `select!` while room snapshots arrive on another branch, and it must be
/// able to `send` those snapshots without waiting for the client to speak.
/// Implementations therefore must not hold one lock across both
/// directions.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Next data frame from the client, or `Ok(None)` once it has closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Starts a clean close from the server side.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;

    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn test_connection_id_display_in_logs() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
        assert_eq!(ConnectionId::new(7).into_inner(), 7);
    }

    #[test]
    fn test_connection_id_sorts_by_allocation_order() {
        let ids: BTreeSet<_> =
            [3, 1, 2].into_iter().map(ConnectionId::new).collect();
        let raw: Vec<u64> = ids.into_iter().map(ConnectionId::into_inner).collect();
        assert_eq!(raw, vec![1, 2, 3]);
    }
}
