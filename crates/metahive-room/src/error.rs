//! Error types for the room layer.

use metahive_protocol::{PlayerId, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Every candidate code drawn for a new room was already taken.
    #[error("no free room code after {attempts} attempts")]
    CapacityExhausted { attempts: usize },

    /// A player was handed to a room other than the one it names.
    #[error("player {player_id} names room {player_room}, not {room_id}")]
    RoomMismatch {
        room_id: RoomId,
        player_id: PlayerId,
        player_room: RoomId,
    },
}
