//! Error types for the protocol layer.

/// Errors raised while encoding or decoding a message.
///
/// Failures in the JSON codec keep the original `serde_json::Error` so the
/// server can log exactly which field was wrong.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// An outbound event could not be serialized.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame was malformed, missing a field, or had an unknown
    /// `type` tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
