//! Wire-level types for Warden.
//!
//! This crate defines the "vocabulary" shared by every other layer:
//!
//! - **HTTP types** ([`HttpRequest`], [`HttpResponse`], [`Headers`],
//!   [`RequestBody`]): what the interceptors inspect and rewrite.
//! - **Account types** ([`User`], [`Credentials`], [`AuthPayload`],
//!   [`ApiEnvelope`]): the records the session layer persists.
//! - **Text normalization** ([`text::decode`]): turns escaped/encoded
//!   strings inside any JSON value back into plain text.
//! - **Errors** ([`ProtocolError`]): what can go wrong while reading
//!   payloads.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes on the wire) → Protocol (typed request/response) → Session
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod account;
mod error;
mod http;
pub mod text;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use account::{ApiEnvelope, AuthPayload, Credentials, User, user_from_body};
pub use error::ProtocolError;
pub use http::{
    FormPart, FormValue, Headers, HttpRequest, HttpResponse, Method,
    RequestBody, body_message,
};

/// Re-exported so downstream crates name the same JSON value type.
pub use serde_json::Value;
