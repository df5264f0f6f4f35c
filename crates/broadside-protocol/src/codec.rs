//! Codec trait and the JSON implementation.
//!
//! The server never calls `serde_json` directly; it holds something that
//! implements [`Codec`]. Swapping the wire format means adding another
//! implementation, nothing else.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Turns messages into bytes and back.
///
/// `Send + Sync + 'static` because one codec is shared by every connection
/// task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Parses bytes into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. Behind the `json` feature (on by
/// default).
///
/// ```rust
/// use broadside_protocol::{ClientCommand, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let cmd: ClientCommand = codec
///     .decode(br#"{"type":"join","username":"Alice"}"#)
///     .unwrap();
/// assert_eq!(cmd, ClientCommand::Join { username: "Alice".into() });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
