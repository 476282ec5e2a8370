//! Per-connection handler: frame routing, room subscription, cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The task waits on three things at once:
//!   1. an inbound frame → decode, validate, dispatch to the coordinator
//!   2. a snapshot on the subscribed room's channel → forward to the client
//!   3. the idle deadline → drop the connection

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use metahive_protocol::{
    ClientMessage, Codec, Destination, ERROR_BAD_REQUEST, Envelope, RoomId,
    ServerMessage,
};
use metahive_session::{Broadcast, PlayerBinding, Removal};
use metahive_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::MetahiveError;
use crate::server::ServerState;

/// Drop guard that tears down a connection's session when the handler
/// exits, however it exits.
///
/// `Drop` is synchronous, so the async part runs on a spawned task.
struct SessionGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for SessionGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            close_session(&state, conn_id).await;
        });
    }
}

/// The room channel a connection is currently listening to.
struct Subscription {
    room_id: RoomId,
    rx: broadcast::Receiver<Arc<Broadcast>>,
}

/// Outbound side of one connection: stamps each payload with the
/// connection's sequence number and clock before sending it.
struct Outbound<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<C: Codec> Outbound<'_, C> {
    async fn send(
        &mut self,
        destination: Destination,
        payload: ServerMessage,
    ) -> Result<(), MetahiveError> {
        self.seq += 1;
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.start.elapsed().as_millis() as u64,
            destination,
            payload,
        };
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn reply(
        &mut self,
        payload: ServerMessage,
    ) -> Result<(), MetahiveError> {
        self.send(Destination::Session, payload).await
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), MetahiveError> {
    let conn_id = conn.id();
    tracing::info!(%conn_id, peer = ?conn.peer_addr(), "connection opened");

    state.sessions.lock().await.open(conn_id)?;
    let _guard = SessionGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    let mut out = Outbound {
        conn: &conn,
        codec: &state.codec,
        seq: 0,
        start: Instant::now(),
    };
    let mut subscription: Option<Subscription> = None;
    let idle = tokio::time::sleep(state.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) if e.is_disconnect() => {
                        tracing::debug!(%conn_id, error = %e, "client dropped");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(%conn_id, error = %e, "recv failed");
                        break;
                    }
                };
                idle.as_mut()
                    .reset(tokio::time::Instant::now() + state.idle_timeout);
                handle_frame(&state, conn_id, &data, &mut out, &mut subscription)
                    .await?;
            }

            update = next_broadcast(&mut subscription) => match update {
                Ok(broadcast) => {
                    out.send(
                        Destination::Room { room_id: broadcast.room_id.clone() },
                        ServerMessage::Players { players: broadcast.players.clone() },
                    )
                    .await?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(%conn_id, skipped, "subscriber lagged");
                }
                Err(RecvError::Closed) => {
                    // The room was evicted.
                    if let Some(old) = subscription.take() {
                        tracing::debug!(
                            %conn_id,
                            room_id = %old.room_id,
                            "room channel closed"
                        );
                    }
                    state.sessions.lock().await.unsubscribe(conn_id)?;
                }
            },

            () = &mut idle => {
                tracing::info!(%conn_id, "connection timed out");
                if let Err(e) = conn.close().await {
                    tracing::debug!(%conn_id, error = %e, "close failed");
                }
                break;
            }
        }
    }

    // Release the receiver before the guard runs, so the room channel can
    // be dropped if this was its last subscriber.
    drop(subscription);
    // _guard drops here → session cleanup fires.
    Ok(())
}

/// Waits for the next snapshot on the current subscription, or forever if
/// there is none.
async fn next_broadcast(
    subscription: &mut Option<Subscription>,
) -> Result<Arc<Broadcast>, RecvError> {
    match subscription {
        Some(sub) => sub.rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Decodes, validates and dispatches one inbound frame.
///
/// Malformed frames are answered with an error and otherwise ignored; only
/// transport failures end the connection.
async fn handle_frame<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    data: &[u8],
    out: &mut Outbound<'_, C>,
    subscription: &mut Option<Subscription>,
) -> Result<(), MetahiveError> {
    let msg: ClientMessage = match state.codec.decode(data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "failed to decode frame");
            return out
                .reply(ServerMessage::error(ERROR_BAD_REQUEST, e.to_string()))
                .await;
        }
    };
    if let Err(e) = msg.validate() {
        tracing::debug!(%conn_id, kind = msg.kind(), error = %e, "invalid message");
        return out
            .reply(ServerMessage::error(ERROR_BAD_REQUEST, e.to_string()))
            .await;
    }
    tracing::trace!(%conn_id, kind = msg.kind(), "frame received");

    let coordinator = &state.coordinator;
    match msg {
        ClientMessage::CreateRoom { username } => {
            match coordinator.create_room(&username) {
                Ok(room_id) => {
                    subscribe(state, conn_id, subscription, &room_id).await?;
                    out.reply(ServerMessage::RoomCreated {
                        room_id: Some(room_id),
                        success: true,
                    })
                    .await?;
                }
                Err(e) => {
                    tracing::warn!(%conn_id, error = %e, "room creation failed");
                    out.reply(ServerMessage::RoomCreated {
                        room_id: None,
                        success: false,
                    })
                    .await?;
                }
            }
        }

        ClientMessage::JoinRoom { username, room_id } => {
            let success = coordinator.join_room(&username, &room_id);
            if success {
                subscribe(state, conn_id, subscription, &room_id).await?;
            }
            out.reply(ServerMessage::JoinResult { success }).await?;
        }

        ClientMessage::Register { player } => {
            let binding =
                PlayerBinding::new(player.room_id.clone(), player.id.clone());
            let Some(broadcast) = coordinator.register_player(player) else {
                return Ok(());
            };

            let previous = state
                .sessions
                .lock()
                .await
                .bind_player(conn_id, binding.clone())?;
            subscribe(state, conn_id, subscription, &binding.room_id).await?;
            state.channels.publish(broadcast);

            // A connection owns one player: retire the one it had before.
            if let Some(previous) = previous.filter(|p| *p != binding) {
                retire_player(state, &previous);
            }
        }

        ClientMessage::Move { player_movement } => {
            if let Some(broadcast) = coordinator.move_player(&player_movement) {
                state.channels.publish(broadcast);
            }
        }

        ClientMessage::Leave => {
            let binding = state.sessions.lock().await.unbind_player(conn_id)?;
            if let Some(binding) = binding {
                retire_player(state, &binding);
            }
            if let Some(old) = subscription.take() {
                let room_id = old.room_id.clone();
                drop(old);
                state.channels.release(&room_id);
            }
            state.sessions.lock().await.unsubscribe(conn_id)?;
        }

        ClientMessage::Heartbeat { client_time } => {
            out.reply(ServerMessage::HeartbeatAck {
                client_time,
                server_time: unix_millis(),
            })
            .await?;
        }
    }

    Ok(())
}

/// Points the connection at `room_id`'s channel, dropping any previous
/// subscription.
async fn subscribe<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    subscription: &mut Option<Subscription>,
    room_id: &RoomId,
) -> Result<(), MetahiveError> {
    if subscription.as_ref().is_some_and(|s| s.room_id == *room_id) {
        return Ok(());
    }
    let rx = state.channels.subscribe(room_id);
    let old = subscription.replace(Subscription {
        room_id: room_id.clone(),
        rx,
    });
    if let Some(old) = old {
        let old_room = old.room_id.clone();
        drop(old);
        state.channels.release(&old_room);
    }
    state
        .sessions
        .lock()
        .await
        .subscribe(conn_id, room_id.clone())?;
    tracing::debug!(%conn_id, %room_id, "subscribed to room");
    Ok(())
}

/// Removes a player from its room and tells the room, or closes the room's
/// channel if it was the last one out.
fn retire_player<C: Codec>(state: &ServerState<C>, binding: &PlayerBinding) {
    match state
        .coordinator
        .remove_player(&binding.room_id, &binding.player_id)
    {
        Removal::Remaining(broadcast) => {
            state.channels.publish(broadcast);
        }
        Removal::Evicted(room_id) => {
            state.channels.close(&room_id);
        }
        Removal::NotPresent => {}
    }
}

/// Final cleanup once a connection is gone.
async fn close_session<C: Codec>(state: &ServerState<C>, conn_id: ConnectionId) {
    let session = match state.sessions.lock().await.close(conn_id) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(%conn_id, error = %e, "session missing at close");
            return;
        }
    };

    if let Some(binding) = &session.player {
        retire_player(state, binding);
    }
    if let Some(room_id) = &session.subscription {
        state.channels.release(room_id);
    }
    tracing::info!(%conn_id, "connection closed");
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
