//! Room channels: one broadcast channel per active room.
//!
//! Connection handlers subscribe to the room they are in and forward every
//! snapshot published there to their client.

use std::sync::Arc;

use dashmap::DashMap;
use metahive_protocol::RoomId;
use metahive_session::Broadcast;
use tokio::sync::broadcast;

/// Default per-room channel buffer, in snapshots.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Publish/subscribe hub keyed by room.
///
/// Channels are created lazily on first subscribe and closed when the room
/// is evicted. A subscriber that falls more than the channel capacity
/// behind skips ahead to newer snapshots; since every message is a full
/// snapshot, nothing is lost by skipping.
#[derive(Debug)]
pub struct RoomChannels {
    senders: DashMap<RoomId, broadcast::Sender<Arc<Broadcast>>>,
    capacity: usize,
}

impl RoomChannels {
    /// Creates an empty hub. A zero capacity is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            senders: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Subscribes to a room's snapshots, creating its channel if needed.
    pub fn subscribe(
        &self,
        room_id: &RoomId,
    ) -> broadcast::Receiver<Arc<Broadcast>> {
        self.senders
            .entry(room_id.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Sends a snapshot to everyone subscribed to its room.
    ///
    /// Returns how many subscribers it reached. Publishing to a room with
    /// no channel or no subscribers is not an error.
    pub fn publish(&self, broadcast: Broadcast) -> usize {
        let Some(sender) = self.senders.get(&broadcast.room_id) else {
            tracing::trace!(room_id = %broadcast.room_id, "no channel for room");
            return 0;
        };
        sender.send(Arc::new(broadcast)).unwrap_or(0)
    }

    /// Drops a room's channel. Subscribers see the channel close once they
    /// have drained what was already sent.
    pub fn close(&self, room_id: &RoomId) -> bool {
        self.senders.remove(room_id).is_some()
    }

    /// Drops a room's channel if nobody is subscribed any more.
    pub fn release(&self, room_id: &RoomId) -> bool {
        self.senders
            .remove_if(room_id, |_, sender| sender.receiver_count() == 0)
            .is_some()
    }

    pub fn subscriber_count(&self, room_id: &RoomId) -> usize {
        self.senders
            .get(room_id)
            .map_or(0, |sender| sender.receiver_count())
    }

    /// Number of rooms with an open channel.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl Default for RoomChannels {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
