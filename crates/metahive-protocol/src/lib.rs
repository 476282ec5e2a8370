//! Wire protocol for MetaHive.
//!
//! - **Types** ([`Player`], [`PlayerMovement`], [`RoomId`], ...) that live
//!   in rooms and travel in broadcasts.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`], [`Envelope`])
//!   exchanged with browser clients.
//! - **Codec** ([`Codec`], [`JsonCodec`]) turning messages into frame
//!   payloads.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Session (rooms, players)
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{
    ClientMessage, Destination, ERROR_BAD_REQUEST, Envelope,
    ServerMessage,
};
pub use types::{
    Direction, MAX_ANIMATION_LEN, MAX_PLAYER_ID_LEN, MAX_USERNAME_LEN,
    Player, PlayerId, PlayerMap, PlayerMovement, ROOM_CODE_ALPHABET,
    ROOM_CODE_LEN, RoomId, animation_for,
};
