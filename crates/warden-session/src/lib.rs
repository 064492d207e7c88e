//! Session persistence for Warden.
//!
//! This crate owns the client's record of who is signed in:
//!
//! 1. **Persistence**: the `user`/`token`/`authExpiry` triple, written
//!    and cleared together ([`SessionStore`] over a [`Storage`] backend)
//! 2. **Expiry**: an absolute deadline set at save time and never
//!    extended by traffic ([`SessionConfig`], [`Clock`])
//! 3. **Token shape**: structural checks before a token is attached to
//!    a request ([`BearerToken`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (above)  ← attaches tokens, reacts to rejections, drives login/logout
//!     ↕
//! Session Layer (this crate)  ← persists and publishes the signed-in user
//!     ↕
//! Protocol Layer (below)  ← provides User and text decoding
//! ```

mod clock;
mod error;
mod session;
mod storage;
mod store;
mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{SessionError, StorageError};
pub use session::{EXPIRY_KEY, LoadOutcome, Session, SessionConfig, TOKEN_KEY, USER_KEY};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::SessionStore;
pub use token::BearerToken;
