//! Room registry: the set of active rooms.

use std::ops::Deref;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use metahive_protocol::RoomId;

use crate::{CodeSource, RandomCodes, RegistryConfig, Room, RoomError};

/// Owns every active room, keyed by room code.
///
/// ## Lifecycle
///
/// ```text
/// create_room() ──→ active (0..N players) ──evict_if_empty()──→ gone
/// ```
///
/// A room enters the map only through [`create_room`](Self::create_room),
/// which claims a fresh code, and leaves it only through
/// [`evict_if_empty`](Self::evict_if_empty). Codes are unique among active
/// rooms only; an evicted room's code may be handed out again later.
///
/// ## Locking
///
/// Backed by a sharded [`DashMap`]. Room operations run while holding the
/// shard's read guard ([`with_room`](Self::with_room),
/// [`get_room`](Self::get_room)), and eviction takes the write guard, so a
/// room can never be evicted while another thread is registering into it.
///
/// Callers must not call back into the registry while holding a room
/// reference: DashMap shard locks are not reentrant.
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Room>,
    codes: Box<dyn CodeSource>,
    config: RegistryConfig,
}

impl RoomRegistry {
    /// Creates an empty registry drawing random room codes.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            codes: Box::new(RandomCodes),
            config,
        }
    }

    /// Replaces the source of candidate room codes.
    pub fn with_code_source(self, codes: impl CodeSource) -> Self {
        self.with_boxed_code_source(Box::new(codes))
    }

    pub fn with_boxed_code_source(mut self, codes: Box<dyn CodeSource>) -> Self {
        self.codes = codes;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Creates an empty room under a code no active room is using.
    ///
    /// Each candidate is claimed with a single insert-if-vacant on the
    /// map, so two concurrent calls can never end up with the same code.
    ///
    /// # Errors
    /// Returns [`RoomError::CapacityExhausted`] once
    /// [`RegistryConfig::max_code_attempts`] candidates have all collided.
    pub fn create_room(&self) -> Result<RoomId, RoomError> {
        let attempts = self.config.max_code_attempts.max(1);
        for attempt in 1..=attempts {
            let room_id = self.codes.next_code();
            match self.rooms.entry(room_id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(Room::new(room_id.clone()));
                    tracing::info!(%room_id, attempt, "room created");
                    return Ok(room_id);
                }
                Entry::Occupied(_) => {
                    tracing::debug!(%room_id, attempt, "room code collision");
                }
            }
        }
        tracing::warn!(attempts, "no free room code");
        Err(RoomError::CapacityExhausted { attempts })
    }

    pub fn room_exists(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Borrows a room.
    ///
    /// The returned guard holds a shard read lock: drop it before calling
    /// anything else on the registry.
    pub fn get_room<'a>(
        &'a self,
        room_id: &RoomId,
    ) -> Option<impl Deref<Target = Room> + use<'a>> {
        self.rooms.get(room_id)
    }

    /// Runs `f` against a room, if it exists.
    pub fn with_room<R>(
        &self,
        room_id: &RoomId,
        f: impl FnOnce(&Room) -> R,
    ) -> Option<R> {
        self.rooms.get(room_id).map(|room| f(room.value()))
    }

    /// Removes a room if, and only if, it has no players.
    ///
    /// The emptiness check and the removal happen under the same shard
    /// write lock. Returns `true` if the room was evicted.
    pub fn evict_if_empty(&self, room_id: &RoomId) -> bool {
        let evicted = self
            .rooms
            .remove_if(room_id, |_, room| room.is_empty())
            .is_some();
        if evicted {
            tracing::info!(%room_id, "room evicted");
        }
        evicted
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Codes of all active rooms, in no particular order.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("rooms", &self.rooms.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
