//! `MetahiveServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session → room.
//!
//! ```text
//! accept loop ──spawn──→ handler task (one per connection)
//!                           │  decode with the Codec
//!                           ├─→ SessionCoordinator ─→ RoomRegistry
//!                           └─→ RoomChannels ─→ every handler in the room
//! ```
//!
//! All shared state lives in one `Arc<ServerState>`. The room registry
//! and the channel hub are concurrent maps, so handlers touch them without
//! a global lock. Only the per-connection session table sits behind an
//! async mutex, and it is held for a single map operation at a time.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use metahive_protocol::{Codec, JsonCodec};
use metahive_room::{CodeSource, RegistryConfig, RoomRegistry};
use metahive_session::{SessionCoordinator, SessionManager};
use metahive_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::MetahiveError;
use crate::channels::{DEFAULT_CHANNEL_CAPACITY, RoomChannels};
use crate::handler::handle_connection;

/// Default time a connection may stay silent before it is dropped.
///
/// Only inbound frames count. A client whose avatar stands still sends
/// nothing, so it must send [`ClientMessage::Heartbeat`] frames more often
/// than this or its player is removed when the connection is dropped.
///
/// [`ClientMessage::Heartbeat`]: metahive_protocol::ClientMessage::Heartbeat
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) coordinator: SessionCoordinator,
    pub(crate) channels: RoomChannels,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a MetaHive server.
///
/// ```rust,no_run
/// use metahive::prelude::*;
///
/// # async fn run() -> Result<(), MetahiveError> {
/// let server = MetahiveServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct MetahiveServerBuilder {
    bind_addr: String,
    registry_config: RegistryConfig,
    idle_timeout: Duration,
    channel_capacity: usize,
    code_source: Option<Box<dyn CodeSource>>,
}

impl MetahiveServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            registry_config: RegistryConfig::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            code_source: None,
        }
    }

    /// Sets the address to listen on. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// How long a connection may go without sending a frame.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Snapshots buffered per room before slow subscribers start skipping.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Replaces the random room-code generator, e.g. with
    /// [`ScriptedCodes`](metahive_room::ScriptedCodes) for predictable codes.
    pub fn code_source(mut self, source: impl CodeSource) -> Self {
        self.code_source = Some(Box::new(source));
        self
    }

    /// Binds the listener and assembles the server state.
    pub async fn build(self) -> Result<MetahiveServer, MetahiveError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let mut registry = RoomRegistry::with_config(self.registry_config);
        if let Some(source) = self.code_source {
            registry = registry.with_boxed_code_source(source);
        }

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new()),
            coordinator: SessionCoordinator::new(registry),
            channels: RoomChannels::new(self.channel_capacity),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(MetahiveServer { transport, state })
    }
}

impl Default for MetahiveServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound MetaHive server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct MetahiveServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl MetahiveServer {
    pub fn builder() -> MetahiveServerBuilder {
        MetahiveServerBuilder::new()
    }
}

impl<C: Codec> MetahiveServer<C> {
    /// Returns the address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr, MetahiveError> {
        Ok(self.transport.local_addr()?)
    }

    /// Accepts connections forever, one handler task per connection.
    pub async fn run(mut self) -> Result<(), MetahiveError> {
        let addr = self.local_addr()?;
        tracing::info!(%addr, "MetaHive server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
