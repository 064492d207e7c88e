//! Error types for the protocol layer.
//!
//! Each crate in Warden defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in reading or writing a
//! payload, not in networking or session bookkeeping.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into JSON).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed (turning JSON into a Rust type).
    ///
    /// Common causes: a login response without a token, a user record
    /// that is not an object, wrong field types.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The payload is valid JSON but doesn't have the expected shape.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
