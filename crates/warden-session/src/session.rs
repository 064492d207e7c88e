//! Session types: the persisted triple and how long it lives.
//!
//! A "session" is the client's record of a signed-in user. It tracks:
//! - WHO is signed in (the decoded [`User`] record)
//! - HOW requests prove it (the opaque bearer token)
//! - WHEN it stops being valid (an absolute expiry, epoch milliseconds)

use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_protocol::User;

/// Storage key of the JSON-encoded user record.
pub const USER_KEY: &str = "user";
/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key of the expiry, epoch milliseconds as a decimal string.
pub const EXPIRY_KEY: &str = "authExpiry";

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a session lasts from the moment it is saved.
    ///
    /// Default: 24 hours. Requests never extend it; only a new save
    /// (login, profile refresh) does.
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl SessionConfig {
    /// Smallest accepted lifetime.
    pub const MIN_TTL: Duration = Duration::from_secs(1);

    /// Clamps out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        if self.ttl < Self::MIN_TTL {
            tracing::warn!(ttl = ?self.ttl, "session ttl too small, clamping");
            self.ttl = Self::MIN_TTL;
        }
        self
    }

    /// The lifetime in milliseconds, saturating at `i64::MAX`.
    pub fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A complete persisted session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub token: String,
    /// Absolute expiry, epoch milliseconds.
    pub expires_at: i64,
}

impl Session {
    /// `true` while `now_millis` is before the expiry.
    pub fn is_valid_at(&self, now_millis: i64) -> bool {
        now_millis < self.expires_at
    }
}

/// What [`SessionStore::load`](crate::SessionStore::load) found.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// At least one of the three fields is missing.
    Missing,
    /// All fields are present but the expiry has passed. The caller
    /// must clear the store.
    Expired,
    /// A valid session, now published to observers.
    Restored(Session),
}
