//! Error types for the Warden façade.

use warden_protocol::ProtocolError;
use warden_recovery::{Classification, FailureKind};
use warden_session::{SessionError, StorageError};
use warden_transport::{HttpFailure, TransportError};

/// The caller-facing error of a request that went through the pipeline.
///
/// By the time a caller sees one of these, any session side effect
/// (forced logout, reset, notice, scheduled redirect) has already
/// happened. The caller only has to display something.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The failure ended the session; `message` says why in plain words.
    #[error("{message}")]
    Recovered {
        kind: FailureKind,
        status: u16,
        message: String,
    },

    /// The server refused the request; the session is untouched.
    #[error("{message}")]
    Forbidden { message: String },

    /// Any other failure, passed through as received (body normalized).
    #[error(transparent)]
    Unclassified(HttpFailure),
}

impl ApiError {
    /// Builds the caller-facing error for a classified failure.
    pub fn from_classification(classification: Classification, failure: HttpFailure) -> Self {
        match classification.kind {
            FailureKind::Forbidden => Self::Forbidden {
                message: classification.message,
            },
            FailureKind::Unclassified => Self::Unclassified(failure),
            kind => Self::Recovered {
                kind,
                status: classification.status,
                message: classification.message,
            },
        }
    }

    /// HTTP status of the failed exchange; `0` when nothing came back.
    pub fn status(&self) -> u16 {
        match self {
            Self::Recovered { status, .. } => *status,
            Self::Forbidden { .. } => 403,
            Self::Unclassified(failure) => failure.status_code(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Recovered { kind, .. } => *kind,
            Self::Forbidden { .. } => FailureKind::Forbidden,
            Self::Unclassified(_) => FailureKind::Unclassified,
        }
    }

    /// The server-provided message of a pass-through failure.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unclassified(failure) => failure.message(),
            _ => None,
        }
    }

    /// Text for sign-in and password screens.
    ///
    /// Known statuses map to fixed sentences; anything else falls back
    /// to the server's own message.
    pub fn user_message(&self) -> String {
        match self.status() {
            401 => "Invalid email or password.".to_string(),
            422 => "Some of the submitted information is invalid.".to_string(),
            0 => "Unable to reach the server. Check your connection and try again.".to_string(),
            500..=599 => "The server encountered an error. Please try again later.".to_string(),
            _ => self
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| self.to_string()),
        }
    }
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// The request failed (already classified and handled).
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Persisting or reading the session failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A payload couldn't be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The transport couldn't be set up.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered 2xx but the body lacked what the call needs.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<StorageError> for WardenError {
    fn from(err: StorageError) -> Self {
        Self::Session(err.into())
    }
}

impl WardenError {
    /// The request error, if this is one.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Text for sign-in and password screens.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_recovery::{RecoveryConfig, classify};

    fn api_error(failure: HttpFailure) -> ApiError {
        let classification = classify(&failure, &RecoveryConfig::default());
        ApiError::from_classification(classification, failure)
    }

    #[test]
    fn test_from_classification_unauthorized_is_recovered() {
        let err = api_error(HttpFailure::status(401, None));

        assert!(matches!(err, ApiError::Recovered { kind: FailureKind::Unauthorized, status: 401, .. }));
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_from_classification_forbidden_keeps_status() {
        let err = api_error(HttpFailure::status(403, Some(json!({ "message": "no" }))));

        assert_eq!(err.kind(), FailureKind::Forbidden);
        assert_eq!(err.status(), 403);
    }

    #[test]
    fn test_from_classification_unclassified_passes_failure_through() {
        let failure = HttpFailure::status(409, Some(json!({ "message": "Email already taken" })));

        let err = api_error(failure.clone());

        assert!(matches!(&err, ApiError::Unclassified(f) if *f == failure));
        assert_eq!(err.server_message(), Some("Email already taken"));
    }

    #[test]
    fn test_user_message_maps_known_statuses() {
        let cases = [
            (401, "Invalid email or password."),
            (422, "Some of the submitted information is invalid."),
            (503, "The server encountered an error. Please try again later."),
        ];
        for (status, expected) in cases {
            let err = ApiError::Unclassified(HttpFailure::status(status, None));
            assert_eq!(err.user_message(), expected, "status {status}");
        }
    }

    #[test]
    fn test_user_message_falls_back_to_server_message() {
        let err = ApiError::Unclassified(HttpFailure::status(
            409,
            Some(json!({ "message": "Email already taken" })),
        ));

        assert_eq!(err.user_message(), "Email already taken");
    }

    #[test]
    fn test_user_message_for_unreachable_server() {
        let err = api_error(HttpFailure::Transport(TransportError::Network("refused".into())));

        assert_eq!(err.status(), 0);
        assert!(err.user_message().starts_with("Unable to reach the server"));
    }

    #[test]
    fn test_from_session_error() {
        let err: WardenError = SessionError::NoSession.into();
        assert!(matches!(err, WardenError::Session(_)));
        assert!(err.api().is_none());
    }

    #[test]
    fn test_from_storage_error() {
        let err: WardenError = StorageError::Corrupt("bad".into()).into();
        assert!(matches!(err, WardenError::Session(SessionError::Storage(_))));
    }
}
