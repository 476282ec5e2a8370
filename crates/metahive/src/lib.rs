//! # MetaHive
//!
//! Real-time multiplayer presence server for browser clients.
//!
//! Clients create or join rooms identified by six-character codes,
//! register a player, and stream movement updates. Every change to a room
//! is fanned out to all of that room's connections as a full snapshot of
//! its players.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use metahive::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MetahiveError> {
//!     let server = MetahiveServer::builder()
//!         .bind("0.0.0.0:8080")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod channels;
mod error;
mod handler;
mod server;

pub use channels::{DEFAULT_CHANNEL_CAPACITY, RoomChannels};
pub use error::MetahiveError;
pub use server::{DEFAULT_IDLE_TIMEOUT, MetahiveServer, MetahiveServerBuilder};

pub use metahive_protocol as protocol;
pub use metahive_room as room;
pub use metahive_session as session;
pub use metahive_transport as transport;

/// The types most servers and tests need.
pub mod prelude {
    pub use crate::{MetahiveError, MetahiveServer, MetahiveServerBuilder};
    pub use metahive_protocol::{
        ClientMessage, Destination, Direction, Envelope, Player, PlayerId,
        PlayerMap, PlayerMovement, RoomId, ServerMessage,
    };
    pub use metahive_room::{
        CodeSource, RandomCodes, RegistryConfig, RoomError, ScriptedCodes,
    };
    pub use metahive_session::{Broadcast, Removal, SessionCoordinator};
}
