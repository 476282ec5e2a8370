//! Unified error type for MetaHive.

use metahive_protocol::ProtocolError;
use metahive_room::RoomError;
use metahive_session::SessionError;
use metahive_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` conversions let `?` lift sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum MetahiveError {
    /// Binding, accepting, sending or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encoding, decoding or validating a message failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Per-connection session bookkeeping failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),
}
