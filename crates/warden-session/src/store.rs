//! The session store: single writer of the persisted session triple.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Writing `user`, `token` and `authExpiry` together on save
//! - Reading them back (and spotting expired sessions) on load
//! - Removing all three on clear
//! - Keeping an in-memory mirror (`current user`, `is authenticated`)
//!   that observers can read or subscribe to without touching storage
//!
//! # Publication order
//!
//! Every `save`/`clear` republishes the mirror before returning, through
//! `tokio::sync::watch` channels. Anyone reading the store right after a
//! login therefore sees the new user, and subscribers are woken.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use warden_protocol::{User, text};

use crate::session::{EXPIRY_KEY, TOKEN_KEY, USER_KEY};
use crate::{
    Clock, LoadOutcome, MemoryStorage, Session, SessionConfig, SessionError,
    Storage, SystemClock,
};

/// Persists the session triple and mirrors it in memory.
///
/// ## Lifecycle
///
/// ```text
/// save() ──→ [stored + published] ──→ clear() ──→ [empty + published]
///                    │
///                    ▼ (process restart)
///                 load() ──→ Restored | Expired (caller clears) | Missing
/// ```
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    user_tx: watch::Sender<Option<User>>,
    authenticated_tx: watch::Sender<bool>,
}

impl SessionStore {
    /// Creates a store over `storage`. Nothing is read until [`load`](Self::load).
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, config: SessionConfig) -> Self {
        let (user_tx, _) = watch::channel(None);
        let (authenticated_tx, _) = watch::channel(false);
        Self {
            storage,
            clock,
            config: config.validated(),
            user_tx,
            authenticated_tx,
        }
    }

    /// A store over fresh in-memory storage and the system clock.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(SystemClock),
            SessionConfig::default(),
        )
    }

    /// Saves a new session for `user`, valid for the configured TTL.
    ///
    /// The user record is text-decoded before it is written, so storage
    /// never holds escape sequences. All three fields are written as one
    /// set, then the mirror is republished.
    ///
    /// # Errors
    /// Returns a storage error if the write fails (the mirror is then
    /// left untouched) or a protocol error if the user can't be encoded.
    pub fn save(&self, user: &User, token: &str) -> Result<Session, SessionError> {
        let user = decode_user(user)?;
        let user_json = serde_json::to_string(&user)
            .map_err(|e| SessionError::Corrupt(e.to_string()))?;
        let expires_at = self.clock.now_millis().saturating_add(self.config.ttl_millis());
        let expiry = expires_at.to_string();

        self.storage.set_many(&[
            (USER_KEY, user_json.as_str()),
            (TOKEN_KEY, token),
            (EXPIRY_KEY, expiry.as_str()),
        ])?;

        self.publish(Some(user.clone()));
        tracing::info!(expires_at, "session saved");

        Ok(Session {
            user,
            token: token.to_string(),
            expires_at,
        })
    }

    /// Reads the persisted session.
    ///
    /// - any field missing → [`LoadOutcome::Missing`]
    /// - expiry reached → [`LoadOutcome::Expired`] (nothing is cleared here)
    /// - otherwise the user is decoded, published, and returned
    ///
    /// # Errors
    /// Returns [`SessionError::Corrupt`] if the expiry isn't a number or
    /// the user record isn't valid JSON.
    pub fn load(&self) -> Result<LoadOutcome, SessionError> {
        let user = self.storage.get(USER_KEY)?;
        let token = self.storage.get(TOKEN_KEY)?;
        let expiry = self.storage.get(EXPIRY_KEY)?;

        let (Some(user), Some(token), Some(expiry)) = (user, token, expiry) else {
            return Ok(LoadOutcome::Missing);
        };

        let expires_at = parse_expiry(&expiry)?;
        if self.clock.now_millis() >= expires_at {
            tracing::info!(expires_at, "persisted session has expired");
            return Ok(LoadOutcome::Expired);
        }

        let value: Value = serde_json::from_str(&user)
            .map_err(|e| SessionError::Corrupt(format!("user: {e}")))?;
        let user = User::from_value(text::decode(value))?;

        self.publish(Some(user.clone()));
        tracing::info!(expires_at, "session restored");

        Ok(LoadOutcome::Restored(Session {
            user,
            token,
            expires_at,
        }))
    }

    /// Removes all three fields and publishes the signed-out state.
    ///
    /// The mirror is reset even if storage fails, so the process never
    /// keeps acting as a user it tried to sign out.
    ///
    /// # Errors
    /// Returns the storage error, after the mirror has been reset.
    pub fn clear(&self) -> Result<(), SessionError> {
        let result = self.storage.remove_many(&[USER_KEY, TOKEN_KEY, EXPIRY_KEY]);
        self.publish(None);
        tracing::info!("session cleared");
        result.map_err(SessionError::from)
    }

    /// `true` iff token and expiry are both stored and now < expiry.
    ///
    /// Reads storage but never changes it; unreadable state counts as
    /// invalid.
    pub fn is_valid(&self) -> bool {
        match self.expires_at() {
            Ok(Some(expires_at)) => {
                matches!(self.token(), Ok(Some(_))) && self.clock.now_millis() < expires_at
            }
            _ => false,
        }
    }

    /// The stored token, if any.
    pub fn token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.storage.get(TOKEN_KEY)?)
    }

    /// The stored expiry, if any.
    pub fn expires_at(&self) -> Result<Option<i64>, SessionError> {
        self.storage
            .get(EXPIRY_KEY)?
            .map(|raw| parse_expiry(&raw))
            .transpose()
    }

    /// Shallow-merges `patch` into the stored user and rewrites it.
    ///
    /// Token and expiry are left exactly as they are.
    ///
    /// # Errors
    /// Returns [`SessionError::NoSession`] if no user is stored, or a
    /// protocol error if `patch` is not an object.
    pub fn merge_user(&self, patch: &Value) -> Result<User, SessionError> {
        let raw = self.storage.get(USER_KEY)?.ok_or(SessionError::NoSession)?;
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| SessionError::Corrupt(format!("user: {e}")))?;
        let current = User::from_value(value)?;

        let merged = decode_user(&current.merged(patch)?)?;
        let user_json = serde_json::to_string(&merged)
            .map_err(|e| SessionError::Corrupt(e.to_string()))?;
        self.storage.set(USER_KEY, &user_json)?;

        self.user_tx.send_replace(Some(merged.clone()));
        tracing::debug!("user record merged");
        Ok(merged)
    }

    /// Last published user. No I/O.
    pub fn current_user(&self) -> Option<User> {
        self.user_tx.borrow().clone()
    }

    /// Last published authentication flag. No I/O.
    pub fn is_authenticated(&self) -> bool {
        *self.authenticated_tx.borrow()
    }

    /// Change notifications for the current user.
    pub fn subscribe_user(&self) -> watch::Receiver<Option<User>> {
        self.user_tx.subscribe()
    }

    /// Change notifications for the authentication flag.
    pub fn subscribe_authenticated(&self) -> watch::Receiver<bool> {
        self.authenticated_tx.subscribe()
    }

    /// The store's notion of "now", in epoch milliseconds.
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn publish(&self, user: Option<User>) {
        let authenticated = user.is_some();
        self.user_tx.send_replace(user);
        self.authenticated_tx.send_replace(authenticated);
    }
}

fn decode_user(user: &User) -> Result<User, SessionError> {
    Ok(User::from_value(text::decode(user.to_value()?))?)
}

fn parse_expiry(raw: &str) -> Result<i64, SessionError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| SessionError::Corrupt(format!("authExpiry is not a number: {raw:?}")))
}

// =========================================================================
// Tests
// =========================================================================
