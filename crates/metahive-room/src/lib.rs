//! Room state for MetaHive.
//!
//! A [`RoomRegistry`] owns every active [`Room`]; a room owns its players.
//! Everything here is synchronous and in-memory. Callers on async tasks
//! call straight in, since no operation awaits or blocks for long.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms under fresh codes, looks them up,
//!   evicts them once empty
//! - [`Room`]: one room's player map behind its own lock
//! - [`CodeSource`]: where candidate room codes come from
//! - [`RegistryConfig`]: registry settings

mod code;
mod config;
mod error;
mod registry;
mod room;

pub use code::{CodeSource, RandomCodes, ScriptedCodes, random_code};
pub use config::{DEFAULT_MAX_CODE_ATTEMPTS, RegistryConfig};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::Room;
