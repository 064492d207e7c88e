//! # Warden
//!
//! Client-side session management for applications that talk to a
//! bearer-token HTTP API.
//!
//! Warden keeps track of who is signed in and for how long, attaches the
//! token to outgoing requests, signs the user out after inactivity, and
//! turns backend failures (expired token, suspended account, unreachable
//! server) into the right local reaction.
//!
//! ## Architecture
//!
//! ```text
//! SessionManager (this crate)  ← façade, request pipeline, account operations
//!     ↕
//! warden-recovery  ← classify failures, notices
//! warden-idle      ← inactivity deadline
//! warden-session   ← persisted user/token/expiry
//!     ↕
//! warden-transport ← HTTP exchange
//! warden-protocol  ← request/response/user types, text decoding
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use warden::prelude::*;
//!
//! # async fn run() -> Result<(), WardenError> {
//! let manager = SessionManager::builder()
//!     .build_http(TransportConfig::with_base_url("https://api.example.com"))?;
//!
//! let user = manager
//!     .login(&Credentials::new("alice@example.com", "s3cret"))
//!     .await?;
//! println!("signed in as {:?}", user.display_name());
//!
//! // Every UI event handler:
//! manager.activity().pulse();
//! # Ok(())
//! # }
//! ```

mod account;
mod builder;
mod endpoints;
mod error;
mod interceptor;
mod manager;
mod navigator;
mod state;

pub use builder::SessionManagerBuilder;
pub use endpoints::Endpoints;
pub use error::{ApiError, WardenError};
pub use interceptor::{Authorization, RejectReason, RequestAuthenticator, ResponseNormalizer};
pub use manager::SessionManager;
pub use navigator::{ChannelNavigator, Navigator, NoopNavigator, Route};
pub use state::AuthState;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use warden::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ApiError, AuthState, ChannelNavigator, Endpoints, Navigator, NoopNavigator, Route,
        SessionManager, SessionManagerBuilder, WardenError,
    };
    pub use warden_idle::{ActivityHub, IdleConfig};
    pub use warden_protocol::{Credentials, FormPart, FormValue, HttpRequest, HttpResponse, User};
    pub use warden_recovery::{FailureKind, Notice, NoticeKind, NotificationBroker, RecoveryConfig};
    pub use warden_session::{FileStorage, MemoryStorage, SessionConfig, Storage};
    pub use warden_transport::{HttpFailure, HttpTransport, Transport, TransportConfig, TransportError};
}
