//! Per-connection session state.

use std::time::Instant;

use metahive_protocol::{PlayerId, RoomId};
use metahive_transport::ConnectionId;

/// The player a connection registered, and where.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerBinding {
    pub room_id: RoomId,
    pub player_id: PlayerId,
}

impl PlayerBinding {
    pub fn new(room_id: RoomId, player_id: PlayerId) -> Self {
        Self { room_id, player_id }
    }
}

/// What the server knows about one open connection.
///
/// A connection listens to at most one room at a time and owns at most
/// one player. The two usually agree, but a client may join (and so listen
/// to) a room before registering in it.
#[derive(Debug, Clone)]
pub struct Session {
    pub connection_id: ConnectionId,
    /// Room whose broadcasts this connection receives.
    pub subscription: Option<RoomId>,
    /// Player this connection registered.
    pub player: Option<PlayerBinding>,
    pub opened_at: Instant,
}

impl Session {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            subscription: None,
            player: None,
            opened_at: Instant::now(),
        }
    }
}
