//! `SessionManager`: the façade that ties the layers together.
//!
//! This is the piece an application holds on to. It owns:
//! - the [`SessionStore`] (persisted session + observable mirror)
//! - the [`InactivityMonitor`] (idle logout)
//! - the [`NotificationBroker`] (recovery notices)
//! - the request pipeline (authenticator → transport → normalizer →
//!   classifier)
//! - the pending delayed redirect of the suspension/connectivity flows
//!
//! # Shared state
//!
//! All of it lives in one `Arc<Inner>`. The manager is cheap to clone;
//! every clone drives the same session. Timers and the idle monitor
//! hold only `Weak` references back into `Inner`, so dropping the last
//! manager tears everything down.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use warden_idle::{ActivityHub, IdleConfig, InactivityMonitor};
use warden_protocol::{HttpRequest, HttpResponse, User};
use warden_recovery::{
    FailureKind, Notice, NotificationBroker, RecoveryConfig, RecoveryHooks, apply, classify,
};
use warden_session::{BearerToken, LoadOutcome, SessionError, SessionStore};
use warden_transport::{HttpFailure, Transport};

use crate::{
    ApiError, AuthState, Authorization, Endpoints, Navigator, RequestAuthenticator,
    ResponseNormalizer, Route, SessionManagerBuilder, WardenError,
};

// ---------------------------------------------------------------------------
// Inner
// ---------------------------------------------------------------------------

struct PendingRedirect {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct RedirectSlot {
    pending: Option<PendingRedirect>,
    generation: u64,
}

/// Everything the builder hands over.
pub(crate) struct Parts<T> {
    pub(crate) transport: T,
    pub(crate) store: Arc<SessionStore>,
    pub(crate) idle: IdleConfig,
    pub(crate) activity: ActivityHub,
    pub(crate) notices: NotificationBroker,
    pub(crate) navigator: Arc<dyn Navigator>,
    pub(crate) endpoints: Endpoints,
    pub(crate) recovery: RecoveryConfig,
}

pub(crate) struct Inner<T: Transport> {
    this: Weak<Inner<T>>,
    transport: T,
    pub(crate) store: Arc<SessionStore>,
    monitor: InactivityMonitor,
    activity: ActivityHub,
    notices: NotificationBroker,
    navigator: Arc<dyn Navigator>,
    authenticator: RequestAuthenticator,
    recovery: RecoveryConfig,
    state: watch::Sender<AuthState>,
    redirect: Mutex<RedirectSlot>,
}

impl<T: Transport> Inner<T> {
    fn redirect_slot(&self) -> MutexGuard<'_, RedirectSlot> {
        self.redirect.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn endpoints(&self) -> &Endpoints {
        self.authenticator.endpoints()
    }

    // -- Startup ----------------------------------------------------------

    /// Re-evaluates the persisted session once, before anyone reads the
    /// state.
    fn restore(&self) -> Result<(), WardenError> {
        match self.store.load() {
            Ok(LoadOutcome::Restored(session)) => {
                self.state.send_replace(AuthState::Authenticated);
                self.monitor.start();
                info!(expires_at = session.expires_at, "restored persisted session");
            }
            Ok(LoadOutcome::Expired) => {
                info!("persisted session expired, clearing");
                self.store.clear()?;
            }
            Ok(LoadOutcome::Missing) => debug!("no persisted session"),
            Err(err @ (SessionError::Corrupt(_) | SessionError::Protocol(_))) => {
                warn!(error = %err, "persisted session unreadable, clearing");
                self.store.clear()?;
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    // -- Session transitions ----------------------------------------------

    /// Saves a fresh session and moves to `Authenticated`.
    pub(crate) fn establish(&self, user: &User, token: &str) -> Result<User, SessionError> {
        self.cancel_redirect();
        let session = self.store.save(user, token)?;
        self.state.send_replace(AuthState::Authenticated);
        self.monitor.start();
        let name = session.user.display_name();
        info!(user = name.as_deref().unwrap_or("-"), "signed in");
        Ok(session.user)
    }

    fn end_session(&self) {
        self.monitor.stop();
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear persisted session");
        }
    }

    fn logout(&self) -> Result<(), SessionError> {
        self.cancel_redirect();
        self.monitor.stop();
        let result = self.store.clear();
        self.state.send_replace(AuthState::Anonymous);
        info!("signed out");
        self.navigator.navigate(Route::Login);
        result
    }

    fn force_logout(&self) {
        self.cancel_redirect();
        self.end_session();
        self.state.send_replace(AuthState::Anonymous);
        warn!("session force-ended");
        self.navigator.navigate(Route::Login);
    }

    // -- Delayed redirect -------------------------------------------------

    fn cancel_redirect(&self) {
        let mut slot = self.redirect_slot();
        if let Some(pending) = slot.pending.take() {
            pending.handle.abort();
            debug!(generation = pending.generation, "pending login redirect cancelled");
        }
    }

    fn complete_redirect(&self, generation: u64) {
        {
            let mut slot = self.redirect_slot();
            match &slot.pending {
                Some(pending) if pending.generation == generation => slot.pending = None,
                _ => return,
            }
        }
        self.state.send_if_modified(|state| {
            let suspended = *state == AuthState::Suspended;
            if suspended {
                *state = AuthState::Anonymous;
            }
            suspended
        });
        info!("redirecting to login");
        self.navigator.navigate(Route::Login);
    }

    // -- Pipeline ---------------------------------------------------------

    /// Authorize → send → normalize → classify → apply.
    pub(crate) async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let endpoint = request.endpoint().to_string();
        let method = request.method;

        let verdict = self.authenticator.authorize(&mut request, &self.store);
        match verdict {
            Authorization::Excluded => {
                debug!(%method, path = %endpoint, "excluded endpoint, sending without credentials");
            }
            Authorization::Attached => {
                debug!(%method, path = %endpoint, "credentials attached");
            }
            Authorization::Rejected(reason) => {
                // The request still goes out, unmodified.
                warn!(%method, path = %endpoint, %reason, "credentials unusable, forcing logout");
                self.force_logout();
            }
        }

        let failure = match self.transport.send(request).await {
            Ok(response) if response.is_success() => {
                return Ok(ResponseNormalizer::response(response));
            }
            Ok(response) => ResponseNormalizer::failure(HttpFailure::Status {
                status: response.status,
                headers: response.headers,
                body: response.body,
            }),
            Err(error) => HttpFailure::Transport(error),
        };

        Err(self.recover(failure, verdict == Authorization::Excluded, &endpoint))
    }

    fn recover(&self, failure: HttpFailure, excluded: bool, endpoint: &str) -> ApiError {
        let status = failure.status_code();
        if excluded {
            debug!(status, path = %endpoint, "excluded endpoint failed, passing error through");
            return ApiError::Unclassified(failure);
        }

        let classification = classify(&failure, &self.recovery);
        debug!(kind = %classification.kind, status, path = %endpoint, "request failed");

        if classification.kind == FailureKind::Unauthorized {
            let claimed_expiry = self
                .store
                .token()
                .ok()
                .flatten()
                .and_then(|raw| BearerToken::parse(&raw).ok())
                .and_then(|token| token.expiry_claim());
            let now = self.store.now_millis();
            debug!(
                claimed_expiry,
                claim_expired = claimed_expiry.is_some_and(|exp| exp <= now),
                "server rejected bearer token"
            );
        }

        apply(&classification, self);
        ApiError::from_classification(classification, failure)
    }
}

impl<T: Transport> RecoveryHooks for Inner<T> {
    fn force_logout(&self) {
        Inner::force_logout(self);
    }

    fn reset_session(&self) {
        self.end_session();
        self.state.send_replace(AuthState::Suspended);
    }

    fn show_notice(&self, notice: Notice) {
        self.notices.show(notice);
    }

    fn redirect_to_login_after(&self, delay: Duration) {
        let mut slot = self.redirect_slot();
        if let Some(previous) = slot.pending.take() {
            previous.handle.abort();
        }
        slot.generation += 1;
        let generation = slot.generation;

        let this = self.this.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = this.upgrade() {
                inner.complete_redirect(generation);
            }
        });
        slot.pending = Some(PendingRedirect { generation, handle });
    }
}

impl<T: Transport> Drop for Inner<T> {
    fn drop(&mut self) {
        let slot = self.redirect.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = slot.pending.take() {
            pending.handle.abort();
        }
        self.monitor.stop();
    }
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Client-side session manager.
///
/// Create one per process with [`SessionManager::builder`] and share
/// clones of it. Every request that needs credentials goes through
/// [`send`](Self::send) (or one of the account operations built on it).
pub struct SessionManager<T: Transport> {
    pub(crate) inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for SessionManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SessionManager<warden_transport::HttpTransport> {
    /// Creates a new builder.
    pub fn builder() -> SessionManagerBuilder {
        SessionManagerBuilder::new()
    }
}

impl<T: Transport> SessionManager<T> {
    /// Wires the parts together and restores any persisted session.
    pub(crate) fn from_parts(parts: Parts<T>) -> Result<Self, WardenError> {
        let (state, _) = watch::channel(AuthState::Anonymous);
        let inner = Arc::new_cyclic(|this: &Weak<Inner<T>>| {
            let on_timeout = this.clone();
            let monitor = InactivityMonitor::new(
                parts.idle,
                Arc::clone(&parts.store),
                parts.activity.clone(),
                move || {
                    if let Some(inner) = on_timeout.upgrade() {
                        inner.force_logout();
                    }
                },
            );
            Inner {
                this: this.clone(),
                transport: parts.transport,
                store: parts.store,
                monitor,
                activity: parts.activity,
                notices: parts.notices,
                navigator: parts.navigator,
                authenticator: RequestAuthenticator::new(parts.endpoints),
                recovery: parts.recovery,
                state,
                redirect: Mutex::new(RedirectSlot::default()),
            }
        });
        inner.restore()?;
        Ok(Self { inner })
    }

    /// Sends `request` through the full pipeline.
    ///
    /// # Errors
    /// Any non-2xx response or transport failure comes back as an
    /// [`ApiError`], after its session side effects have run.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.inner.send(request).await
    }

    /// User-initiated sign-out. Local only; no request is made.
    ///
    /// # Errors
    /// Returns the storage error if the persisted session could not be
    /// removed. The in-memory state is signed out regardless.
    pub fn logout(&self) -> Result<(), WardenError> {
        Ok(self.inner.logout()?)
    }

    /// Ends the session immediately and navigates to login.
    pub fn force_logout(&self) {
        self.inner.force_logout();
    }

    // -- Reads ------------------------------------------------------------

    pub fn is_authenticated(&self) -> bool {
        self.inner.store.is_authenticated()
    }

    /// Checks storage: token and expiry present, expiry in the future.
    pub fn is_session_valid(&self) -> bool {
        self.inner.store.is_valid()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.store.current_user()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user().is_some_and(|user| user.is_admin())
    }

    pub fn state(&self) -> AuthState {
        *self.inner.state.borrow()
    }

    /// Time left before the idle timeout, for display.
    pub fn idle_remaining(&self) -> Duration {
        self.inner.monitor.remaining()
    }

    /// Whether a delayed login redirect is waiting to fire.
    pub fn redirect_pending(&self) -> bool {
        self.inner.redirect_slot().pending.is_some()
    }

    // -- Subscriptions ----------------------------------------------------

    pub fn subscribe_state(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    pub fn subscribe_user(&self) -> watch::Receiver<Option<User>> {
        self.inner.store.subscribe_user()
    }

    pub fn subscribe_authenticated(&self) -> watch::Receiver<bool> {
        self.inner.store.subscribe_authenticated()
    }

    pub fn subscribe_notices(&self) -> watch::Receiver<Option<Notice>> {
        self.inner.notices.subscribe()
    }

    // -- Collaborators ----------------------------------------------------

    /// Where the UI reports activity (pointer, keyboard, touch, scroll).
    pub fn activity(&self) -> &ActivityHub {
        &self.inner.activity
    }

    pub fn notices(&self) -> &NotificationBroker {
        &self.inner.notices
    }

    pub fn monitor(&self) -> &InactivityMonitor {
        &self.inner.monitor
    }

    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    pub fn endpoints(&self) -> &Endpoints {
        self.inner.endpoints()
    }
}

impl<T: Transport> std::fmt::Debug for SessionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .field("redirect_pending", &self.redirect_pending())
            .finish()
    }
}
