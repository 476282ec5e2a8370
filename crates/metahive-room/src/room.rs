//! A single room and its players.

use std::sync::{Mutex, MutexGuard, PoisonError};

use metahive_protocol::{Player, PlayerId, PlayerMap, PlayerMovement, RoomId};

use crate::RoomError;

/// One room: an id plus the players currently in it.
///
/// The player map sits behind the room's own mutex, so traffic in one room
/// never waits on another. Every method takes the lock for a single
/// statement-sized critical section and hands back owned data.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    players: Mutex<PlayerMap>,
}

impl Room {
    /// Creates an empty room.
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            players: Mutex::new(PlayerMap::new()),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    // A panic elsewhere while holding the lock cannot leave the map
    // half-updated: every mutation is a single insert, remove, or in-place
    // field update.
    fn lock(&self) -> MutexGuard<'_, PlayerMap> {
        self.players.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or overwrites a player, keyed by its id. Last write wins.
    ///
    /// Returns the player that was replaced, if any.
    ///
    /// # Errors
    /// Returns [`RoomError::RoomMismatch`] if `player.room_id` names a
    /// different room. The room is left unchanged.
    pub fn add_player(
        &self,
        player: Player,
    ) -> Result<Option<Player>, RoomError> {
        if player.room_id != self.id {
            tracing::error!(
                room_id = %self.id,
                player_id = %player.id,
                player_room = %player.room_id,
                "player routed to the wrong room"
            );
            return Err(RoomError::RoomMismatch {
                room_id: self.id.clone(),
                player_id: player.id,
                player_room: player.room_id,
            });
        }
        Ok(self.lock().insert(player.id.clone(), player))
    }

    /// Applies a movement update to an existing player.
    ///
    /// Returns `false`, changing nothing, if the player is not in the room.
    pub fn move_player(&self, movement: &PlayerMovement) -> bool {
        match self.lock().get_mut(&movement.id) {
            Some(player) => {
                player.apply_movement(movement);
                true
            }
            None => false,
        }
    }

    /// Removes a player, returning it if it was present.
    pub fn remove_player(&self, id: &PlayerId) -> Option<Player> {
        self.lock().remove(id)
    }

    /// Returns an owned copy of the player map.
    pub fn players(&self) -> PlayerMap {
        self.lock().clone()
    }

    /// Returns a copy of one player.
    pub fn player(&self, id: &PlayerId) -> Option<Player> {
        self.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.lock().contains_key(id)
    }

    pub fn player_count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
