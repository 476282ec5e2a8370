//! Messages exchanged with clients.
//!
//! Inbound traffic is a bare [`ClientMessage`]. Outbound traffic is always
//! wrapped in an [`Envelope`] that says whether the payload was addressed to
//! this connection alone or fanned out to a whole room.

use serde::{Deserialize, Serialize};

use crate::types::{PlayerMap, validate_username};
use crate::{Player, PlayerMovement, ProtocolError, RoomId};

/// Error code sent for malformed or invalid client frames.
pub const ERROR_BAD_REQUEST: u16 = 400;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Something a client asks the server to do.
///
/// Tagged by `"type"`:
///
/// ```json
/// {"type":"join-room","username":"bob","roomId":"AB12C9"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Allocate a fresh room. Adds no player.
    CreateRoom { username: String },

    /// Ask whether a room exists.
    #[serde(rename_all = "camelCase")]
    JoinRoom { username: String, room_id: RoomId },

    /// Add (or overwrite) a player in the room named by `player.roomId`.
    Register { player: Player },

    /// Update a registered player's motion state.
    #[serde(rename_all = "camelCase")]
    Move { player_movement: PlayerMovement },

    /// Remove this connection's player from its room.
    Leave,

    /// Keep-alive; answered with [`ServerMessage::HeartbeatAck`].
    ///
    /// The server drops connections that send nothing for its idle timeout
    /// (60 s by default) and removes their player. Movement frames reset
    /// the timer, but a client standing still must send heartbeats to stay
    /// in the room.
    #[serde(rename_all = "camelCase")]
    Heartbeat { client_time: u64 },
}

impl ClientMessage {
    /// Short name of the event, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create-room",
            Self::JoinRoom { .. } => "join-room",
            Self::Register { .. } => "register",
            Self::Move { .. } => "move",
            Self::Leave => "leave",
            Self::Heartbeat { .. } => "heartbeat",
        }
    }

    /// Checks the fields serde cannot: non-blank bounded usernames, non-empty
    /// ids, and finite coordinates.
    ///
    /// Room codes are not checked here; an unknown or malformed code is an
    /// ordinary lookup miss.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::CreateRoom { username } | Self::JoinRoom { username, .. } => {
                validate_username(username)
            }
            Self::Register { player } => player.validate(),
            Self::Move { player_movement } => player_movement.validate(),
            Self::Leave | Self::Heartbeat { .. } => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Something the server tells a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Reply to `create-room`. `roomId` is `null` when creation failed.
    #[serde(rename_all = "camelCase")]
    RoomCreated {
        room_id: Option<RoomId>,
        success: bool,
    },

    /// Reply to `join-room`.
    JoinResult { success: bool },

    /// Full snapshot of a room's players, keyed by player id.
    Players { players: PlayerMap },

    /// Reply to `heartbeat`.
    #[serde(rename_all = "camelCase")]
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// The client's last frame was rejected.
    Error { code: u16, message: String },
}

impl ServerMessage {
    /// Builds an [`ServerMessage::Error`].
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

/// Who an outbound payload was addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Destination {
    /// Only the connection that sent the request.
    Session,
    /// Every connection subscribed to the room.
    Room {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
}

/// Outbound frame.
///
/// `seq` counts frames sent on one connection, starting at 1. `timestamp`
/// is milliseconds since that connection was accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub seq: u64,
    pub timestamp: u64,
    pub destination: Destination,
    pub payload: ServerMessage,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{Direction, PlayerId};

    fn decode(json: &str) -> ClientMessage {
        serde_json::from_str(json).expect("should decode")
    }

    // =====================================================================
    // ClientMessage
    // =====================================================================

    #[test]
    fn test_client_message_create_room() {
        let msg = decode(r#"{"type":"create-room","username":"alice"}"#);
        assert_eq!(
            msg,
            ClientMessage::CreateRoom {
                username: "alice".into()
            }
        );
    }

    #[test]
    fn test_client_message_join_room_uses_room_id_field() {
        let msg = decode(
            r#"{"type":"join-room","username":"bob","roomId":"AB12C9"}"#,
        );
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                username: "bob".into(),
                room_id: RoomId::new("AB12C9"),
            }
        );
    }

    #[test]
    fn test_client_message_register_minimal_player() {
        let msg = decode(
            r#"{"type":"register","player":{"id":"p1","roomId":"AB12C9","username":"alice","x":0,"y":0}}"#,
        );
        let ClientMessage::Register { player } = msg else {
            panic!("expected Register, got {msg:?}");
        };
        assert_eq!(player.id, PlayerId::new("p1"));
        assert_eq!(player.direction, Direction::Down);
    }

    #[test]
    fn test_client_message_move_ignores_unknown_fields() {
        let msg = decode(
            r#"{"type":"move","playerMovement":{"id":"p1","roomId":"AB12C9","username":"alice","x":5,"y":7,"direction":"right","isMoving":true}}"#,
        );
        let ClientMessage::Move { player_movement } = msg else {
            panic!("expected Move, got {msg:?}");
        };
        assert_eq!((player_movement.x, player_movement.y), (5.0, 7.0));
        assert_eq!(player_movement.direction, Some(Direction::Right));
        assert_eq!(player_movement.is_moving, Some(true));
        assert_eq!(player_movement.animation, None);
    }

    #[test]
    fn test_client_message_leave_and_heartbeat() {
        assert_eq!(decode(r#"{"type":"leave"}"#), ClientMessage::Leave);
        assert_eq!(
            decode(r#"{"type":"heartbeat","clientTime":1234}"#),
            ClientMessage::Heartbeat { client_time: 1234 }
        );
    }

    #[test]
    fn test_client_message_unknown_type_is_rejected() {
        let result =
            serde_json::from_str::<ClientMessage>(r#"{"type":"teleport"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_message_missing_field_is_rejected() {
        let result = serde_json::from_str::<ClientMessage>(
            r#"{"type":"join-room","username":"bob"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_blank_username() {
        let msg = ClientMessage::CreateRoom {
            username: "".into(),
        };
        assert!(matches!(
            msg.validate(),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_player_id_on_move() {
        let msg = ClientMessage::Move {
            player_movement: PlayerMovement::to("", "AB12C9", 0.0, 0.0),
        };
        assert!(msg.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_unknown_room_code() {
        // A lookup miss, not a malformed frame.
        let msg = ClientMessage::JoinRoom {
            username: "bob".into(),
            room_id: RoomId::new("nope"),
        };
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_kind_names_match_wire_tags() {
        let msg = ClientMessage::Heartbeat { client_time: 1 };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], msg.kind());
        assert_eq!(ClientMessage::Leave.kind(), "leave");
    }

    // =====================================================================
    // ServerMessage / Envelope
    // =====================================================================

    #[test]
    fn test_room_created_failure_has_null_room_id() {
        let json = serde_json::to_value(ServerMessage::RoomCreated {
            room_id: None,
            success: false,
        })
        .unwrap();
        assert_eq!(
            json,
            json!({"type": "room-created", "roomId": null, "success": false})
        );
    }

    #[test]
    fn test_players_snapshot_is_keyed_by_player_id() {
        let player = Player::new("p1", "AB12C9", "alice", 0.0, 0.0);
        let mut players = PlayerMap::new();
        players.insert(player.id.clone(), player);

        let json =
            serde_json::to_value(ServerMessage::Players { players }).unwrap();
        assert_eq!(json["type"], "players");
        assert_eq!(json["players"]["p1"]["username"], "alice");
        assert_eq!(json["players"]["p1"]["roomId"], "AB12C9");
    }

    #[test]
    fn test_heartbeat_ack_fields_are_camel_case() {
        let json = serde_json::to_value(ServerMessage::HeartbeatAck {
            client_time: 1,
            server_time: 2,
        })
        .unwrap();
        assert_eq!(
            json,
            json!({"type": "heartbeat-ack", "clientTime": 1, "serverTime": 2})
        );
    }

    #[test]
    fn test_envelope_room_destination_shape() {
        let envelope = Envelope {
            seq: 3,
            timestamp: 120,
            destination: Destination::Room {
                room_id: RoomId::new("AB12C9"),
            },
            payload: ServerMessage::JoinResult { success: true },
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            json!({
                "seq": 3,
                "timestamp": 120,
                "destination": {"kind": "room", "roomId": "AB12C9"},
                "payload": {"type": "join-result", "success": true},
            })
        );
    }

    #[test]
    fn test_envelope_session_destination_shape() {
        let envelope = Envelope {
            seq: 1,
            timestamp: 0,
            destination: Destination::Session,
            payload: ServerMessage::error(ERROR_BAD_REQUEST, "bad frame"),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["destination"], json!({"kind": "session"}));
        assert_eq!(json["payload"]["code"], 400);
    }
}
