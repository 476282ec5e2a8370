//! Concurrency tests for the room registry.
//!
//! These hammer one registry from many OS threads at once and check that
//! nothing is lost, duplicated, or evicted out from under a writer.

use std::collections::HashSet;
use std::sync::Barrier;

use metahive_protocol::{Player, PlayerId, PlayerMovement, RoomId};
use metahive_room::{RoomRegistry, ScriptedCodes};

const THREADS: usize = 16;

fn player(room_id: &RoomId, id: String) -> Player {
    Player::new(id.clone(), room_id.clone(), id, 0.0, 0.0)
}

#[test]
fn test_concurrent_registers_all_land() {
    let registry = RoomRegistry::new();
    let room_id = registry.create_room().unwrap();
    let per_thread = 50;
    let barrier = Barrier::new(THREADS);

    std::thread::scope(|s| {
        for t in 0..THREADS {
            let registry = &registry;
            let room_id = &room_id;
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    let p = player(room_id, format!("t{t}-p{i}"));
                    registry
                        .with_room(room_id, |room| room.add_player(p))
                        .expect("room exists")
                        .expect("player belongs here");
                }
            });
        }
    });

    let players = registry.with_room(&room_id, |room| room.players()).unwrap();
    assert_eq!(players.len(), THREADS * per_thread);
    assert!(players.contains_key(&PlayerId::new("t0-p0")));
    assert!(players.contains_key(&PlayerId::new(format!(
        "t{}-p{}",
        THREADS - 1,
        per_thread - 1
    ))));
}

#[test]
fn test_concurrent_creates_never_share_a_code() {
    let registry = RoomRegistry::new();
    let per_thread = 100;
    let barrier = Barrier::new(THREADS);

    let ids: Vec<RoomId> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = &registry;
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    (0..per_thread)
                        .map(|_| registry.create_room().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let distinct: HashSet<_> = ids.iter().cloned().collect();
    assert_eq!(distinct.len(), THREADS * per_thread);
    assert_eq!(registry.room_count(), THREADS * per_thread);
}

#[test]
fn test_concurrent_creates_on_one_code_only_one_wins() {
    // Every candidate is the same code: exactly one create can claim it.
    let registry =
        RoomRegistry::new().with_code_source(ScriptedCodes::new(["AB12C9"]));
    let barrier = Barrier::new(THREADS);

    let wins = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = &registry;
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    registry.create_room().is_ok()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count()
    });

    assert_eq!(wins, 1);
    assert_eq!(registry.room_ids(), vec![RoomId::new("AB12C9")]);
}

#[test]
fn test_eviction_never_drops_a_registered_player() {
    // One thread keeps registering and removing a player; another keeps
    // trying to evict. A successful register must always find its room,
    // and a room must only ever vanish while empty.
    let registry = RoomRegistry::new();
    let room_id = registry.create_room().unwrap();
    let rounds = 2_000;

    std::thread::scope(|s| {
        s.spawn(|| {
            for i in 0..rounds {
                let p = player(&room_id, format!("p{i}"));
                let id = p.id.clone();
                match registry.with_room(&room_id, |room| room.add_player(p)) {
                    Some(result) => {
                        result.unwrap();
                        // Still there: nothing evicted a non-empty room.
                        assert!(registry.room_exists(&room_id));
                        registry.with_room(&room_id, |room| {
                            room.move_player(&PlayerMovement::to(
                                id.clone(),
                                room_id.clone(),
                                1.0,
                                1.0,
                            ));
                            room.remove_player(&id)
                        });
                    }
                    None => break,
                }
            }
        });
        s.spawn(|| {
            for _ in 0..rounds {
                if registry.evict_if_empty(&room_id) {
                    break;
                }
            }
        });
    });

    // Whatever the interleaving, an evicted room held nobody.
    if let Some(count) = registry.with_room(&room_id, |room| room.player_count())
    {
        assert_eq!(count, 0);
    }
}
