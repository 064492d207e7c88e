//! Error types for the session layer.

use warden_protocol::ProtocolError;

/// Errors raised by a [`Storage`](crate::Storage) backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but isn't a JSON object of strings.
    #[error("storage file is corrupt: {0}")]
    Corrupt(String),
}

/// Errors that can occur during session management.
///
/// These cover persistence (storage failures, unreadable records) and
/// the operations that need an existing session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A persisted field couldn't be read back (bad JSON user record,
    /// non-numeric expiry).
    #[error("persisted session is unreadable: {0}")]
    Corrupt(String),

    /// The user record couldn't be encoded, decoded, or merged.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The operation needs a session, and there is none.
    #[error("no active session")]
    NoSession,

    /// The token is not three dot-separated base64url segments.
    #[error("malformed bearer token: {0}")]
    MalformedToken(String),
}
