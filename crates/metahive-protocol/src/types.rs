//! Identity and player types shared by every layer.
//!
//! These are the values that live inside rooms and travel inside
//! broadcasts. Field names on the wire are camelCase because browser
//! clients read them straight into JavaScript objects.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Number of characters in a room code.
pub const ROOM_CODE_LEN: usize = 6;

/// Symbols a room code is drawn from: uppercase ASCII letters and digits.
pub const ROOM_CODE_ALPHABET: &[u8; 36] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Longest accepted player id, in bytes.
pub const MAX_PLAYER_ID_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of a player, unique within one room.
///
/// Chosen by the client (the browser generates a random string) and taken
/// as-is. Serialized as a plain JSON string.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps a raw id without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks that the id is non-empty and at most [`MAX_PLAYER_ID_LEN`]
    /// bytes.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.0.is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "player id must not be empty".into(),
            ));
        }
        if self.0.len() > MAX_PLAYER_ID_LEN {
            return Err(ProtocolError::InvalidMessage(format!(
                "player id longer than {MAX_PLAYER_ID_LEN} bytes"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PlayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a room: a [`ROOM_CODE_LEN`]-character code over
/// [`ROOM_CODE_ALPHABET`], e.g. `AB12C9`.
///
/// Codes are case-sensitive. Deserialization does not enforce the format,
/// so a client asking for a malformed code simply finds no room; use
/// [`RoomId::parse`] where the format must hold.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps a raw code without validation.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Parses a room code, rejecting anything that is not exactly
    /// [`ROOM_CODE_LEN`] symbols from [`ROOM_CODE_ALPHABET`].
    pub fn parse(code: &str) -> Result<Self, ProtocolError> {
        let id = Self::new(code);
        if id.is_well_formed() {
            Ok(id)
        } else {
            Err(ProtocolError::InvalidMessage(format!(
                "malformed room code {code:?}"
            )))
        }
    }

    /// Returns `true` if the code has the generated shape.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == ROOM_CODE_LEN
            && self.0.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RoomId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for RoomId {
    fn from(code: String) -> Self {
        Self(code)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Which way a player sprite is facing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// Lowercase name, as used on the wire and in animation names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the clip a client plays for a facing and motion state:
/// `run-<direction>` while moving, `idle-<direction>` otherwise.
pub fn animation_for(direction: Direction, is_moving: bool) -> String {
    let action = if is_moving { "run" } else { "idle" };
    format!("{action}-{direction}")
}

/// Longest accepted display name, in characters.
pub const MAX_USERNAME_LEN: usize = 32;

/// Longest accepted animation name, in bytes.
pub const MAX_ANIMATION_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One participant in a room: identity plus transient motion state.
///
/// `direction`, `isMoving`, `animation` and `timestamp` may be omitted on
/// registration. An omitted animation is left empty by deserialization and
/// filled in by [`Player::fill_defaults`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub room_id: RoomId,
    pub username: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub is_moving: bool,
    #[serde(default)]
    pub animation: String,
    /// Client clock in milliseconds. Informational only.
    #[serde(default)]
    pub timestamp: u64,
}

impl Player {
    /// Creates an idle, down-facing player at `(x, y)`.
    pub fn new(
        id: impl Into<PlayerId>,
        room_id: impl Into<RoomId>,
        username: impl Into<String>,
        x: f64,
        y: f64,
    ) -> Self {
        let direction = Direction::default();
        Self {
            id: id.into(),
            room_id: room_id.into(),
            username: username.into(),
            x,
            y,
            direction,
            is_moving: false,
            animation: animation_for(direction, false),
            timestamp: 0,
        }
    }

    /// Derives the animation from facing and motion when none was sent.
    pub fn fill_defaults(&mut self) {
        if self.animation.is_empty() {
            self.animation = animation_for(self.direction, self.is_moving);
        }
    }

    /// Applies a movement update in place.
    ///
    /// Only the motion fields change; `id`, `room_id` and `username` are
    /// never touched. Optional fields absent from the update keep their
    /// stored value, except the animation, which is re-derived from the
    /// resulting facing and motion state when not supplied.
    pub fn apply_movement(&mut self, movement: &PlayerMovement) {
        self.x = movement.x;
        self.y = movement.y;
        if let Some(direction) = movement.direction {
            self.direction = direction;
        }
        if let Some(is_moving) = movement.is_moving {
            self.is_moving = is_moving;
        }
        self.animation = match &movement.animation {
            Some(animation) => animation.clone(),
            None => animation_for(self.direction, self.is_moving),
        };
        if let Some(timestamp) = movement.timestamp {
            self.timestamp = timestamp;
        }
    }

    /// Checks identity fields and coordinates.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        self.id.validate()?;
        validate_username(&self.username)?;
        validate_position(self.x, self.y)?;
        validate_animation(&self.animation)
    }
}

/// A movement update for an already-registered player.
///
/// Unknown fields (clients often echo their whole player object, including
/// `username`) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMovement {
    pub id: PlayerId,
    pub room_id: RoomId,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_moving: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl PlayerMovement {
    /// A position-only update.
    pub fn to(
        id: impl Into<PlayerId>,
        room_id: impl Into<RoomId>,
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            id: id.into(),
            room_id: room_id.into(),
            x,
            y,
            direction: None,
            is_moving: None,
            animation: None,
            timestamp: None,
        }
    }

    /// Checks the target id and coordinates.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        self.id.validate()?;
        validate_position(self.x, self.y)?;
        match &self.animation {
            Some(animation) => validate_animation(animation),
            None => Ok(()),
        }
    }
}

/// A room's players keyed by id. Always an owned copy, never a view into
/// live room state.
pub type PlayerMap = HashMap<PlayerId, Player>;

pub(crate) fn validate_username(username: &str) -> Result<(), ProtocolError> {
    if username.trim().is_empty() {
        return Err(ProtocolError::InvalidMessage(
            "username must not be blank".into(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ProtocolError::InvalidMessage(format!(
            "username longer than {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_position(x: f64, y: f64) -> Result<(), ProtocolError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(ProtocolError::InvalidMessage(
            "position must be finite".into(),
        ))
    }
}

fn validate_animation(animation: &str) -> Result<(), ProtocolError> {
    if animation.len() > MAX_ANIMATION_LEN {
        return Err(ProtocolError::InvalidMessage(format!(
            "animation longer than {MAX_ANIMATION_LEN} bytes"
        )));
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================
