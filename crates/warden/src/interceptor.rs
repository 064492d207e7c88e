//! The two interceptors wrapped around every exchange.
//!
//! ```text
//! request ──→ RequestAuthenticator ──→ Transport ──→ ResponseNormalizer ──→ classifier
//!             (attach credentials)                   (decode text, both
//!                                                     success and error)
//! ```
//!
//! Both are plain values with no I/O of their own; the pipeline in
//! [`SessionManager::send`](crate::SessionManager::send) decides what to
//! do with their verdicts.

use std::fmt;

use warden_protocol::{HttpRequest, HttpResponse, text};
use warden_session::{BearerToken, SessionStore};
use warden_transport::HttpFailure;

use crate::Endpoints;

// ---------------------------------------------------------------------------
// RequestAuthenticator
// ---------------------------------------------------------------------------

/// Why credentials could not be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No session, or the session has expired.
    SessionInvalid,
    /// A session exists but has no token.
    MissingToken,
    /// The token is not three base64url segments.
    MalformedToken,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionInvalid => write!(f, "session invalid or expired"),
            Self::MissingToken => write!(f, "token missing"),
            Self::MalformedToken => write!(f, "token malformed"),
        }
    }
}

/// The authenticator's verdict on one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// The endpoint takes no credentials; the request is untouched.
    Excluded,
    /// Credentials and JSON headers were attached.
    Attached,
    /// Credentials are unusable; the request is untouched and the
    /// session must be force-ended.
    Rejected(RejectReason),
}

/// Outbound interceptor: attaches the bearer token.
#[derive(Debug, Clone, Default)]
pub struct RequestAuthenticator {
    endpoints: Endpoints,
}

impl RequestAuthenticator {
    pub fn new(endpoints: Endpoints) -> Self {
        Self { endpoints }
    }

    /// Inspects `request` and, when the session allows it, adds
    /// `Authorization`, `Accept`, and (unless the body is multipart)
    /// `Content-Type`.
    ///
    /// Only [`Authorization::Attached`] modifies the request.
    pub fn authorize(&self, request: &mut HttpRequest, store: &SessionStore) -> Authorization {
        if self.endpoints.is_excluded(request.endpoint()) {
            return Authorization::Excluded;
        }
        if !store.is_valid() {
            return Authorization::Rejected(RejectReason::SessionInvalid);
        }
        let Ok(Some(raw)) = store.token() else {
            return Authorization::Rejected(RejectReason::MissingToken);
        };
        let Ok(token) = BearerToken::parse(&raw) else {
            return Authorization::Rejected(RejectReason::MalformedToken);
        };

        request.headers.insert("Authorization", token.authorization());
        request.headers.insert("Accept", "application/json");
        if !request.body.is_multipart() {
            request.headers.insert("Content-Type", "application/json");
        }
        Authorization::Attached
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

// ---------------------------------------------------------------------------
// ResponseNormalizer
// ---------------------------------------------------------------------------

/// Inbound interceptor: decodes escaped text in every body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseNormalizer;

impl ResponseNormalizer {
    /// Decodes the body of any response, success or not.
    pub fn response(mut response: HttpResponse) -> HttpResponse {
        response.body = response.body.map(text::decode);
        response
    }

    /// Decodes the body of a failure, if it has one.
    pub fn failure(mut failure: HttpFailure) -> HttpFailure {
        if let Some(body) = failure.body_mut() {
            *body = text::decode(body.take());
        }
        failure
    }
}
