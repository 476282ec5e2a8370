//! The presence coordinator: inbound events in, broadcasts out.

use metahive_protocol::{Player, PlayerId, PlayerMap, PlayerMovement, RoomId};
use metahive_room::{Room, RoomError, RoomRegistry};

/// A room snapshot to publish to everyone listening to the room.
#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    pub room_id: RoomId,
    pub players: PlayerMap,
}

/// Outcome of [`SessionCoordinator::remove_player`].
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    /// The room or the player was already gone. Nothing changed.
    NotPresent,
    /// The player left; others remain. Publish this snapshot so clients
    /// drop the departed avatar.
    Remaining(Broadcast),
    /// The player was the last one out and the room was evicted.
    Evicted(RoomId),
}

/// Façade over the [`RoomRegistry`] used by connection handlers.
///
/// Every state-changing operation returns the room's full player snapshot
/// rather than a delta. Events aimed at rooms or players that no longer
/// exist are dropped and logged, never reported as errors: they are the
/// normal tail of a disconnect race.
#[derive(Debug, Default)]
pub struct SessionCoordinator {
    registry: RoomRegistry,
}

impl SessionCoordinator {
    pub fn new(registry: RoomRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Creates an empty room. The requester is not added to it; they
    /// register separately.
    pub fn create_room(&self, username: &str) -> Result<RoomId, RoomError> {
        let room_id = self.registry.create_room()?;
        tracing::info!(%room_id, username, "room requested");
        Ok(room_id)
    }

    /// Answers whether `room_id` is an active room.
    pub fn join_room(&self, username: &str, room_id: &RoomId) -> bool {
        let exists = self.registry.room_exists(room_id);
        tracing::debug!(%room_id, username, exists, "join requested");
        exists
    }

    pub fn room_exists(&self, room_id: &RoomId) -> bool {
        self.registry.room_exists(room_id)
    }

    /// Adds or overwrites a player in the room it names.
    ///
    /// Returns the room snapshot including the player, or `None` if the
    /// room does not exist. Registering never creates a room.
    pub fn register_player(&self, mut player: Player) -> Option<Broadcast> {
        player.fill_defaults();
        let room_id = player.room_id.clone();
        let player_id = player.id.clone();

        let outcome = self.registry.with_room(&room_id, |room| {
            room.add_player(player).map(|previous| (previous, room.players()))
        });

        match outcome {
            Some(Ok((previous, players))) => {
                if previous.is_some() {
                    tracing::debug!(%room_id, %player_id, "player re-registered");
                } else {
                    tracing::info!(%room_id, %player_id, "player registered");
                }
                Some(Broadcast { room_id, players })
            }
            // Already logged by the room.
            Some(Err(_)) => None,
            None => {
                tracing::debug!(
                    %room_id,
                    %player_id,
                    "register dropped: room not found"
                );
                None
            }
        }
    }

    /// Applies a movement update.
    ///
    /// Returns the room snapshot only if the player existed; otherwise
    /// nothing changes and nothing is broadcast.
    pub fn move_player(&self, movement: &PlayerMovement) -> Option<Broadcast> {
        let room_id = &movement.room_id;
        let players = self
            .registry
            .with_room(room_id, |room| {
                room.move_player(movement).then(|| room.players())
            })
            .flatten();

        match players {
            Some(players) => Some(Broadcast {
                room_id: room_id.clone(),
                players,
            }),
            None => {
                tracing::debug!(
                    %room_id,
                    player_id = %movement.id,
                    "move dropped: player not found"
                );
                None
            }
        }
    }

    /// Removes a player and evicts the room if that emptied it.
    ///
    /// Always safe to call, including for rooms or players that are
    /// already gone.
    pub fn remove_player(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Removal {
        let remaining = self
            .registry
            .with_room(room_id, |room| {
                room.remove_player(player_id).map(|_| room.players())
            })
            .flatten();

        let Some(remaining) = remaining else {
            tracing::debug!(%room_id, %player_id, "remove dropped: not present");
            return Removal::NotPresent;
        };
        tracing::info!(%room_id, %player_id, "player removed");

        if !remaining.is_empty() {
            return Removal::Remaining(Broadcast {
                room_id: room_id.clone(),
                players: remaining,
            });
        }

        if self.registry.evict_if_empty(room_id) {
            return Removal::Evicted(room_id.clone());
        }

        // Someone registered between the removal and the eviction check.
        match self.registry.with_room(room_id, Room::players) {
            Some(players) => Removal::Remaining(Broadcast {
                room_id: room_id.clone(),
                players,
            }),
            None => Removal::Evicted(room_id.clone()),
        }
    }

    /// Snapshot of a room's players; empty if the room does not exist.
    pub fn players_in_room(&self, room_id: &RoomId) -> PlayerMap {
        self.registry
            .with_room(room_id, Room::players)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use metahive_protocol::Direction;
    use metahive_room::ScriptedCodes;

    use super::*;

    fn coordinator() -> SessionCoordinator {
        SessionCoordinator::new(
            RoomRegistry::new()
                .with_code_source(ScriptedCodes::new(["AB12C9", "CD34E5"])),
        )
    }

    fn alice() -> Player {
        Player::new("p1", "AB12C9", "alice", 0.0, 0.0)
    }

    fn bob() -> Player {
        Player::new("p2", "AB12C9", "bob", 10.0, 10.0)
    }

    #[test]
    fn test_create_room_adds_no_player() {
        let coord = coordinator();
        let room_id = coord.create_room("alice").unwrap();

        assert_eq!(room_id, RoomId::new("AB12C9"));
        assert!(coord.room_exists(&room_id));
        assert!(coord.players_in_room(&room_id).is_empty());
    }

    #[test]
    fn test_join_room_is_existence_check() {
        let coord = coordinator();
        let room_id = coord.create_room("alice").unwrap();

        assert!(coord.join_room("bob", &room_id));
        assert!(!coord.join_room("bob", &RoomId::new("ZZZZZZ")));
        // Joining adds nobody.
        assert!(coord.players_in_room(&room_id).is_empty());
    }

    #[test]
    fn test_register_player_broadcasts_snapshot() {
        let coord = coordinator();
        coord.create_room("alice").unwrap();

        let broadcast = coord.register_player(alice()).unwrap();

        assert_eq!(broadcast.room_id, RoomId::new("AB12C9"));
        assert_eq!(broadcast.players.len(), 1);
        assert_eq!(broadcast.players[&PlayerId::new("p1")].animation, "idle-down");
    }

    #[test]
    fn test_register_player_unknown_room_creates_nothing() {
        let coord = coordinator();

        assert!(coord.register_player(alice()).is_none());
        assert!(!coord.room_exists(&RoomId::new("AB12C9")));
        assert!(coord.registry().is_empty());
    }

    #[test]
    fn test_register_player_fills_missing_animation() {
        let coord = coordinator();
        coord.create_room("alice").unwrap();
        let mut p = alice();
        p.animation.clear();
        p.direction = Direction::Left;
        p.is_moving = true;

        let broadcast = coord.register_player(p).unwrap();

        assert_eq!(broadcast.players[&PlayerId::new("p1")].animation, "run-left");
    }

    #[test]
    fn test_move_player_unknown_produces_nothing() {
        let coord = coordinator();
        coord.create_room("alice").unwrap();
        coord.register_player(alice()).unwrap();
        let before = coord.players_in_room(&RoomId::new("AB12C9"));

        let ghost = coord.move_player(&PlayerMovement::to("ghost", "AB12C9", 9.0, 9.0));
        let no_room = coord.move_player(&PlayerMovement::to("p1", "ZZZZZZ", 9.0, 9.0));

        assert!(ghost.is_none());
        assert!(no_room.is_none());
        assert_eq!(coord.players_in_room(&RoomId::new("AB12C9")), before);
    }

    #[test]
    fn test_move_player_broadcasts_updated_snapshot() {
        let coord = coordinator();
        coord.create_room("alice").unwrap();
        coord.register_player(alice()).unwrap();
        coord.register_player(bob()).unwrap();

        let broadcast = coord
            .move_player(&PlayerMovement::to("p1", "AB12C9", 5.0, 7.0))
            .unwrap();

        let p1 = &broadcast.players[&PlayerId::new("p1")];
        assert_eq!((p1.x, p1.y), (5.0, 7.0));
        let p2 = &broadcast.players[&PlayerId::new("p2")];
        assert_eq!((p2.x, p2.y), (10.0, 10.0));
    }

    #[test]
    fn test_remove_player_with_others_left_broadcasts_remaining() {
        let coord = coordinator();
        coord.create_room("alice").unwrap();
        coord.register_player(alice()).unwrap();
        coord.register_player(bob()).unwrap();

        let removal =
            coord.remove_player(&RoomId::new("AB12C9"), &PlayerId::new("p1"));

        let Removal::Remaining(broadcast) = removal else {
            panic!("expected Remaining, got {removal:?}");
        };
        assert_eq!(broadcast.players.len(), 1);
        assert!(broadcast.players.contains_key(&PlayerId::new("p2")));
        assert!(coord.room_exists(&RoomId::new("AB12C9")));
    }

    #[test]
    fn test_remove_last_player_evicts_room() {
        let coord = coordinator();
        coord.create_room("alice").unwrap();
        coord.register_player(alice()).unwrap();

        let removal =
            coord.remove_player(&RoomId::new("AB12C9"), &PlayerId::new("p1"));

        assert_eq!(removal, Removal::Evicted(RoomId::new("AB12C9")));
        assert!(!coord.room_exists(&RoomId::new("AB12C9")));
    }

    #[test]
    fn test_remove_player_absent_is_not_present() {
        let coord = coordinator();
        coord.create_room("alice").unwrap();

        let unknown_player =
            coord.remove_player(&RoomId::new("AB12C9"), &PlayerId::new("p1"));
        let unknown_room =
            coord.remove_player(&RoomId::new("ZZZZZZ"), &PlayerId::new("p1"));

        assert_eq!(unknown_player, Removal::NotPresent);
        assert_eq!(unknown_room, Removal::NotPresent);
        // An empty room is only evicted by a removal that emptied it.
        assert!(coord.room_exists(&RoomId::new("AB12C9")));
    }

    #[test]
    fn test_create_room_stays_until_a_removal_empties_it() {
        let coord = coordinator();
        let first = coord.create_room("alice").unwrap();
        let second = coord.create_room("alice").unwrap();

        // Nobody has registered yet; both rooms stay joinable.
        assert!(coord.join_room("bob", &first));
        assert!(coord.join_room("bob", &second));
        assert!(coord.register_player(alice()).is_some());

        assert!(matches!(
            coord.remove_player(&first, &PlayerId::new("p1")),
            Removal::Evicted(_)
        ));
        assert!(!coord.room_exists(&first));
        assert!(coord.room_exists(&second));
    }

    #[test]
    fn test_players_in_room_unknown_is_empty() {
        let coord = coordinator();
        assert!(coord.players_in_room(&RoomId::new("ZZZZZZ")).is_empty());
    }
}
