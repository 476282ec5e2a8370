//! Byte encoding for protocol messages.
//!
//! The handler never calls `serde_json` directly. It holds a [`Codec`] and
//! asks it to turn an [`Envelope`](crate::Envelope) into frame bytes, or
//! frame bytes into a [`ClientMessage`](crate::ClientMessage). Swapping the
//! wire format means writing another `Codec`; nothing above this module
//! changes.
//!
//! [`JsonCodec`] is the only implementation today. Browser clients call
//! `JSON.parse` on every frame, so JSON text is what they expect.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts protocol messages to and from frame payloads.
///
/// ## Trait bounds
///
/// - `Send + Sync`: one codec lives in the shared server state and every
///   connection task uses it, on whichever Tokio worker it runs.
/// - `'static`: the codec is stored in an `Arc` that outlives any single
///   request, so it cannot borrow short-lived data.
///
/// ## Generic methods
///
/// `encode` and `decode` are generic over the message type rather than
/// tied to [`Envelope`](crate::Envelope), so tests can encode a bare
/// [`ClientMessage`](crate::ClientMessage) with the same codec the server
/// uses. `decode` asks for `DeserializeOwned`: the decoded message owns its
/// strings, and the frame buffer can be dropped right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame payload.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T)
    -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a frame payload.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match `T`.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] producing JSON text, which browser clients parse natively.
///
/// ```rust
/// use metahive_protocol::{ClientMessage, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg: ClientMessage = codec
///     .decode(br#"{"type":"create-room","username":"alice"}"#)
///     .unwrap();
/// assert_eq!(msg.kind(), "create-room");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
