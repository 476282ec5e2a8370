//! Presence coordination for MetaHive.
//!
//! Two pieces sit between the wire and the room registry:
//!
//! - [`SessionCoordinator`] turns each inbound event (create, join,
//!   register, move, remove) into registry operations and hands back the
//!   room snapshot to broadcast, if any.
//! - [`SessionManager`] remembers, per open connection, which room it
//!   listens to, which player it registered, and which room it created,
//!   so the server can clean up after it.
//!
//! ```text
//! Server (above)  ← routes frames, publishes broadcasts
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Room layer (below)  ← RoomRegistry, Room
//! ```

mod coordinator;
mod error;
mod manager;
mod session;

pub use coordinator::{Broadcast, Removal, SessionCoordinator};
pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{PlayerBinding, Session};
