//! Error types for the session layer.

use metahive_transport::ConnectionId;

/// Errors from [`SessionManager`](crate::SessionManager) bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A session is already open for this connection.
    #[error("session already open for {0}")]
    AlreadyOpen(ConnectionId),

    /// No session is open for this connection.
    #[error("no session for {0}")]
    NotFound(ConnectionId),
}
