//! Shared fixtures for the façade's integration tests.
//!
//! [`ScriptedTransport`] stands in for the network: it records every
//! request it is handed and replies from a queue of canned results
//! (`200 {}` once the queue is empty).

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use tokio::sync::mpsc::UnboundedReceiver;
use warden::prelude::*;
use warden_session::{ManualClock, TOKEN_KEY};

pub const T0: i64 = 1_700_000_000_000;
pub const DAY_MS: i64 = 86_400_000;

// =========================================================================
// ScriptedTransport
// =========================================================================

#[derive(Default)]
pub struct ScriptedTransport {
    requests: Mutex<Vec<HttpRequest>>,
    replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
}

impl ScriptedTransport {
    pub fn reply(&self, status: u16, body: Value) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, Some(body))));
    }

    pub fn reply_empty(&self, status: u16) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, None)));
    }

    pub fn fail(&self, error: TransportError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, Some(json!({})))))
    }
}

// =========================================================================
// Harness
// =========================================================================

pub type Manager = SessionManager<Arc<ScriptedTransport>>;

pub struct Harness {
    pub manager: Manager,
    pub transport: Arc<ScriptedTransport>,
    pub storage: Arc<MemoryStorage>,
    pub clock: Arc<ManualClock>,
    pub routes: UnboundedReceiver<Route>,
}

impl Harness {
    /// Routes navigated to since the last call.
    pub fn drain_routes(&mut self) -> Vec<Route> {
        let mut routes = Vec::new();
        while let Ok(route) = self.routes.try_recv() {
            routes.push(route);
        }
        routes
    }

    pub fn persisted_token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).unwrap()
    }
}

/// A manager over empty in-memory storage, frozen at [`T0`].
pub fn harness() -> Harness {
    harness_with_storage(Arc::new(MemoryStorage::new()))
}

/// A manager over `storage`, which may already hold a session.
pub fn harness_with_storage(storage: Arc<MemoryStorage>) -> Harness {
    let transport = Arc::new(ScriptedTransport::default());
    let clock = Arc::new(ManualClock::new(T0));
    let (navigator, routes) = ChannelNavigator::new();

    let manager = SessionManager::builder()
        .storage(storage.clone())
        .clock(clock.clone())
        .navigator(navigator)
        .build(transport.clone())
        .expect("manager builds");

    Harness {
        manager,
        transport,
        storage,
        clock,
        routes,
    }
}

/// A harness with `alice` signed in through the login endpoint.
pub async fn signed_in() -> Harness {
    let mut h = harness();
    h.transport.reply(200, login_body("alice"));
    h.manager
        .login(&Credentials::new("alice@example.com", "s3cret"))
        .await
        .expect("login succeeds");
    h.drain_routes();
    h
}

// =========================================================================
// Payloads
// =========================================================================

/// A structurally valid token: three base64url segments.
pub fn token() -> String {
    token_with_claims(&json!({ "sub": 1 }))
}

pub fn token_with_claims(claims: &Value) -> String {
    let segment = |v: &str| URL_SAFE_NO_PAD.encode(v);
    format!(
        "{}.{}.{}",
        segment(r#"{"alg":"HS256","typ":"JWT"}"#),
        segment(&claims.to_string()),
        segment("signature")
    )
}

pub fn login_body(name: &str) -> Value {
    json!({
        "token": token(),
        "user": { "id": 1, "name": name, "email": format!("{name}@example.com"), "role": "user" },
    })
}
