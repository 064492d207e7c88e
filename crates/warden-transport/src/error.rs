//! Error types for the transport layer.

use serde_json::Value;
use warden_protocol::{Headers, body_message};

/// Errors raised before a response with a status code exists.
///
/// The first three variants are connectivity failures: the request may
/// never have reached the server. The recovery layer treats them like a
/// status-0 response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request didn't complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The server couldn't be reached (DNS, refused, reset, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// The exchange started but broke off while the body was streaming.
    #[error("transfer interrupted: {0}")]
    Interrupted(String),

    /// The request couldn't be built (bad URL, bad header, bad MIME type).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Returns `true` for failures that mean "the server is unreachable".
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Network(_) | Self::Interrupted(_)
        )
    }
}

/// A failed exchange: either an error status or a transport error.
///
/// This is the single input of the error classifier. A transport error
/// reports status `0`, the same way browsers report unreachable servers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HttpFailure {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}{}", message_suffix(.body.as_ref()))]
    Status {
        status: u16,
        headers: Headers,
        body: Option<Value>,
    },

    /// No usable response arrived.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn message_suffix(body: Option<&Value>) -> String {
    body_message(body)
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl HttpFailure {
    /// Builds a status failure without headers.
    pub fn status(status: u16, body: Option<Value>) -> Self {
        Self::Status {
            status,
            headers: Headers::new(),
            body,
        }
    }

    /// The HTTP status, or `0` for transport errors.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Status { status, .. } => *status,
            Self::Transport(_) => 0,
        }
    }

    /// The error body, if the server sent one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => body.as_ref(),
            Self::Transport(_) => None,
        }
    }

    /// Mutable access to the error body, for normalization.
    pub fn body_mut(&mut self) -> Option<&mut Value> {
        match self {
            Self::Status { body, .. } => body.as_mut(),
            Self::Transport(_) => None,
        }
    }

    /// The server-provided `message`, if any.
    pub fn message(&self) -> Option<&str> {
        body_message(self.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_connectivity_covers_network_failures_only() {
        assert!(TransportError::Timeout("t".into()).is_connectivity());
        assert!(TransportError::Network("n".into()).is_connectivity());
        assert!(TransportError::Interrupted("i".into()).is_connectivity());
        assert!(!TransportError::InvalidRequest("bad url".into()).is_connectivity());
    }

    #[test]
    fn test_status_code_is_zero_for_transport_errors() {
        let failure: HttpFailure = TransportError::Network("refused".into()).into();

        assert_eq!(failure.status_code(), 0);
        assert!(failure.body().is_none());
    }

    #[test]
    fn test_display_includes_server_message() {
        let failure = HttpFailure::status(403, Some(json!({ "message": "Accès refusé" })));

        assert_eq!(failure.to_string(), "HTTP 403: Accès refusé");
        assert_eq!(HttpFailure::status(502, None).to_string(), "HTTP 502");
    }
}
