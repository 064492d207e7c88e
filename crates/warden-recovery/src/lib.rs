//! Failure handling for Warden.
//!
//! When an exchange fails, the client has to decide whether the session
//! survives, whether the user needs to be told, and whether to send them
//! back to the login screen.
//!
//! # Key types
//!
//! - [`classify`]: pure mapping from a failure to a [`Classification`]
//!   (a [`FailureKind`] plus the [`RecoveryAction`] to take)
//! - [`apply`]: runs that action through [`RecoveryHooks`]
//! - [`NotificationBroker`]: the single notice slot, with auto-dismiss
//! - [`RecoveryConfig`]: notice duration and redirect delay

mod apply;
mod classify;
mod config;
mod notice;

pub use apply::{RecoveryHooks, apply};
pub use classify::{
    ACCESS_DENIED_MESSAGE, CONNECTION_LOST_MESSAGE,
    Classification, FailureKind, RecoveryAction, SESSION_EXPIRED_MESSAGE,
    TOKEN_INVALID_MESSAGE, classify, connectivity_failure,
};
pub use config::RecoveryConfig;
pub use notice::{Notice, NoticeKind, NotificationBroker};
