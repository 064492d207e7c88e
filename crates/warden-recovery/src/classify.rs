//! Failure classification.
//!
//! [`classify`] looks at a failed exchange and decides two things: what
//! kind of failure it was, and what the client must do about it. It has
//! no side effects. Carrying out the decision is
//! [`apply`](crate::apply)'s job, so every rule here is testable with a
//! plain `HttpFailure` value.
//!
//! # Precedence
//!
//! Rules are tried in order, first match wins:
//!
//! | # | condition | kind | action |
//! |---|---|---|---|
//! | 1 | 500 + "token could not be parsed" | `TokenParseError` | force logout |
//! | 2 | 401 | `Unauthorized` | force logout |
//! | 3 | 403 + suspended-account body | `AccountSuspended` | reset, notice, redirect later |
//! | 4 | 403 | `Forbidden` | none |
//! | 5 | status 0 / connectivity failure | `ConnectionError` | reset, notice, redirect later |
//! | 6 | anything else | `Unclassified` | none |

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_transport::{HttpFailure, TransportError};

use crate::{Notice, RecoveryConfig};

/// Message fragments that identify an unparseable token in a 500 body.
const TOKEN_PARSE_MARKERS: &[&str] = &[
    "token could not be parsed",
    "could not parse token",
    "wrong number of segments",
];

/// Message fragment the backend uses for suspended or inactive accounts.
const SUSPENDED_MARKER: &str = "inactif ou suspendu";

pub const TOKEN_INVALID_MESSAGE: &str = "Your session token is invalid. Please sign in again.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied.";
pub const CONNECTION_LOST_MESSAGE: &str = "The server could not be reached. Please sign in again.";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    TokenParseError,
    Unauthorized,
    AccountSuspended,
    Forbidden,
    ConnectionError,
    Unclassified,
}

impl FailureKind {
    /// Returns `true` for kinds that end the session.
    pub fn resets_session(&self) -> bool {
        matches!(
            self,
            Self::TokenParseError
                | Self::Unauthorized
                | Self::AccountSuspended
                | Self::ConnectionError
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenParseError => write!(f, "TokenParseError"),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::AccountSuspended => write!(f, "AccountSuspended"),
            Self::Forbidden => write!(f, "Forbidden"),
            Self::ConnectionError => write!(f, "ConnectionError"),
            Self::Unclassified => write!(f, "Unclassified"),
        }
    }
}

/// What the client does about a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// End the session and go to login now.
    ForceLogout,

    /// End the session now without navigating, show `notice`, and go
    /// to login after `redirect_after`.
    ResetAndRedirect {
        notice: Notice,
        redirect_after: Duration,
    },

    /// Leave the session alone.
    None,
}

/// The result of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: FailureKind,
    pub action: RecoveryAction,
    /// HTTP status, `0` for transport failures.
    pub status: u16,
    /// A human-readable message for the caller to display.
    pub message: String,
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

/// Classifies a failed exchange.
///
/// Expects the error body to be normalized already, so message checks
/// see decoded text.
pub fn classify(failure: &HttpFailure, config: &RecoveryConfig) -> Classification {
    let status = failure.status_code();
    let server_message = failure.message();

    if status == 500 && server_message.is_some_and(mentions_token_parse) {
        return Classification {
            kind: FailureKind::TokenParseError,
            action: RecoveryAction::ForceLogout,
            status,
            message: TOKEN_INVALID_MESSAGE.to_string(),
        };
    }

    if status == 401 {
        return Classification {
            kind: FailureKind::Unauthorized,
            action: RecoveryAction::ForceLogout,
            status,
            message: SESSION_EXPIRED_MESSAGE.to_string(),
        };
    }

    if status == 403 {
        if let Some(message) = failure.body().and_then(suspended_message) {
            let message = message.to_string();
            return Classification {
                kind: FailureKind::AccountSuspended,
                action: RecoveryAction::ResetAndRedirect {
                    notice: Notice::account_suspended(message.clone())
                        .with_duration(config.notice_duration),
                    redirect_after: config.redirect_delay,
                },
                status,
                message,
            };
        }
        return Classification {
            kind: FailureKind::Forbidden,
            action: RecoveryAction::None,
            status,
            message: ACCESS_DENIED_MESSAGE.to_string(),
        };
    }

    if is_connectivity_failure(failure) {
        return Classification {
            kind: FailureKind::ConnectionError,
            action: RecoveryAction::ResetAndRedirect {
                notice: Notice::connection_lost().with_duration(config.notice_duration),
                redirect_after: config.redirect_delay,
            },
            status: 0,
            message: CONNECTION_LOST_MESSAGE.to_string(),
        };
    }

    Classification {
        kind: FailureKind::Unclassified,
        action: RecoveryAction::None,
        status,
        message: server_message
            .map(str::to_string)
            .unwrap_or_else(|| failure.to_string()),
    }
}

fn mentions_token_parse(message: &str) -> bool {
    let lower = message.to_lowercase();
    TOKEN_PARSE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Returns the message of a `{success:false, status_code:403, message}`
/// body whose message names a suspended account.
fn suspended_message(body: &Value) -> Option<&str> {
    let success = body.get("success")?.as_bool()?;
    let code = body.get("status_code")?;
    let code_is_403 = code.as_u64() == Some(403) || code.as_str() == Some("403");
    let message = body.get("message")?.as_str()?;

    (!success && code_is_403 && message.to_lowercase().contains(SUSPENDED_MARKER)).then_some(message)
}

/// Status 0, or a transport failure meaning the server is unreachable.
///
/// A request that couldn't even be built is a client bug, not lost
/// connectivity, so it stays unclassified.
fn is_connectivity_failure(failure: &HttpFailure) -> bool {
    match failure {
        HttpFailure::Status { status, .. } => *status == 0,
        HttpFailure::Transport(error) => error.is_connectivity(),
    }
}

/// Shorthand used in tests and by callers building failures by hand.
pub fn connectivity_failure(reason: impl Into<String>) -> HttpFailure {
    HttpFailure::Transport(TransportError::Network(reason.into()))
}
