//! The session manager: one entry per open connection.
//!
//! `SessionManager` is a plain `HashMap` and is not thread-safe by itself.
//! The server keeps it behind a single async mutex; every method here is a
//! short map operation.

use std::collections::HashMap;

use metahive_protocol::RoomId;
use metahive_transport::ConnectionId;

use crate::{PlayerBinding, Session, SessionError};

/// Tracks every open connection's subscription and player.
///
/// ```text
/// open() ──→ subscribe() / bind_player() ──→ close()
/// ```
///
/// `close` hands back the final [`Session`] so the caller can undo what it
/// still points at: remove the player, release the room channel.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<ConnectionId, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session for a freshly accepted connection.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyOpen`] if the connection already has
    /// one.
    pub fn open(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<&Session, SessionError> {
        use std::collections::hash_map::Entry;

        match self.sessions.entry(connection_id) {
            Entry::Occupied(_) => Err(SessionError::AlreadyOpen(connection_id)),
            Entry::Vacant(slot) => {
                tracing::debug!(conn_id = %connection_id, "session opened");
                Ok(slot.insert(Session::new(connection_id)))
            }
        }
    }

    /// Closes a session and returns its final state.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session is open.
    pub fn close(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(&connection_id)
            .ok_or(SessionError::NotFound(connection_id))?;
        tracing::debug!(
            conn_id = %connection_id,
            lifetime_ms = session.opened_at.elapsed().as_millis() as u64,
            "session closed"
        );
        Ok(session)
    }

    pub fn get(&self, connection_id: ConnectionId) -> Option<&Session> {
        self.sessions.get(&connection_id)
    }

    fn get_mut(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<&mut Session, SessionError> {
        self.sessions
            .get_mut(&connection_id)
            .ok_or(SessionError::NotFound(connection_id))
    }

    /// Records the player this connection registered.
    ///
    /// Returns the previous binding, which the caller should remove from
    /// its room if it differs: a connection owns one player at a time.
    pub fn bind_player(
        &mut self,
        connection_id: ConnectionId,
        binding: PlayerBinding,
    ) -> Result<Option<PlayerBinding>, SessionError> {
        Ok(self.get_mut(connection_id)?.player.replace(binding))
    }

    /// Forgets this connection's player, returning the old binding.
    pub fn unbind_player(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<Option<PlayerBinding>, SessionError> {
        Ok(self.get_mut(connection_id)?.player.take())
    }

    /// Points this connection at a room's broadcasts, returning the room it
    /// was listening to before.
    pub fn subscribe(
        &mut self,
        connection_id: ConnectionId,
        room_id: RoomId,
    ) -> Result<Option<RoomId>, SessionError> {
        Ok(self.get_mut(connection_id)?.subscription.replace(room_id))
    }

    /// Stops this connection listening to any room.
    pub fn unsubscribe(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<Option<RoomId>, SessionError> {
        Ok(self.get_mut(connection_id)?.subscription.take())
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
