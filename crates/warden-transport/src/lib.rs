//! Transport abstraction layer for Warden.
//!
//! Provides the [`Transport`] trait the request pipeline sends through,
//! plus the error types every failed exchange is described with
//! ([`TransportError`], [`HttpFailure`]).
//!
//! # Feature Flags
//!
//! - `reqwest` (default): HTTP transport via `reqwest` ([`HttpTransport`])

mod error;
#[cfg(feature = "reqwest")]
mod http;

pub use error::{HttpFailure, TransportError};
#[cfg(feature = "reqwest")]
pub use http::{HttpTransport, TransportConfig};

use std::future::Future;
use std::sync::Arc;

use warden_protocol::{HttpRequest, HttpResponse};

/// Sends a request and returns whatever the server answered.
///
/// Implementations return `Ok` for every response that has a status
/// code, including 4xx and 5xx; deciding what counts as a failure is the
/// pipeline's job. `Err` is reserved for exchanges that produced no
/// response at all.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one transport is shared by the session
///   manager and every task that sends through it.
/// - The returned future is `Send` so callers may `tokio::spawn` a
///   request.
pub trait Transport: Send + Sync + 'static {
    /// Sends `request` and waits for the response.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// A shared transport is still a transport.
impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        T::send(self, request)
    }
}
