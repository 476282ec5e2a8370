//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Default for [`RegistryConfig::max_code_attempts`].
pub const DEFAULT_MAX_CODE_ATTEMPTS: usize = 64;

/// Settings for a [`RoomRegistry`](crate::RoomRegistry).
///
/// Missing fields fall back to their defaults when deserialized, so a
/// partial config file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// How many candidate codes `create_room` draws before giving up with
    /// [`RoomError::CapacityExhausted`](crate::RoomError::CapacityExhausted).
    /// Values below 1 are treated as 1.
    pub max_code_attempts: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
        }
    }
}
