//! Protocol-level errors.

/// Errors raised while encoding, decoding or interpreting events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Malformed JSON, an unknown event name or a wrongly shaped payload.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// Well-formed but semantically invalid, e.g. a team id of 2.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
