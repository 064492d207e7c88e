//! `SessionManagerBuilder`: fluent configuration of the façade.

use std::sync::Arc;

use warden_idle::{ActivityHub, IdleConfig};
use warden_recovery::{NotificationBroker, RecoveryConfig};
use warden_session::{Clock, MemoryStorage, SessionConfig, SessionStore, Storage, SystemClock};
use warden_transport::{HttpTransport, Transport, TransportConfig};

use crate::manager::Parts;
use crate::{Endpoints, Navigator, NoopNavigator, SessionManager, WardenError};

/// Builder for configuring a [`SessionManager`].
///
/// Every setting has a default: in-memory storage, the system clock,
/// 24 h sessions, 30 min idle timeout, 4 s recovery notices, and a
/// navigator that does nothing.
///
/// # Example
///
/// ```rust,ignore
/// let manager = SessionManager::builder()
///     .storage(Arc::new(FileStorage::new("session.json")))
///     .navigator(my_router)
///     .build_http(TransportConfig::with_base_url("https://api.example.com"))?;
/// ```
pub struct SessionManagerBuilder {
    session: SessionConfig,
    idle: IdleConfig,
    recovery: RecoveryConfig,
    endpoints: Endpoints,
    storage: Option<Arc<dyn Storage>>,
    clock: Option<Arc<dyn Clock>>,
    navigator: Option<Arc<dyn Navigator>>,
    activity: Option<ActivityHub>,
    notices: Option<NotificationBroker>,
}

impl SessionManagerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            session: SessionConfig::default(),
            idle: IdleConfig::default(),
            recovery: RecoveryConfig::default(),
            endpoints: Endpoints::default(),
            storage: None,
            clock: None,
            navigator: None,
            activity: None,
            notices: None,
        }
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session = config;
        self
    }

    pub fn idle_config(mut self, config: IdleConfig) -> Self {
        self.idle = config;
        self
    }

    pub fn recovery_config(mut self, config: RecoveryConfig) -> Self {
        self.recovery = config;
        self
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Where the session triple is persisted.
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// The wall clock used for session expiry.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn navigator(mut self, navigator: impl Navigator) -> Self {
        self.navigator = Some(Arc::new(navigator));
        self
    }

    /// Shares an activity hub the UI already feeds.
    pub fn activity_hub(mut self, hub: ActivityHub) -> Self {
        self.activity = Some(hub);
        self
    }

    /// Shares a notice slot the UI already renders.
    pub fn notification_broker(mut self, broker: NotificationBroker) -> Self {
        self.notices = Some(broker);
        self
    }

    /// Builds the manager over `transport` and restores any persisted
    /// session: a valid one is published and the idle monitor started;
    /// an expired or unreadable one is cleared.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Errors
    /// Returns a storage error if the persisted session can't be read
    /// or cleared.
    pub fn build<T: Transport>(self, transport: T) -> Result<SessionManager<T>, WardenError> {
        let storage: Arc<dyn Storage> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(MemoryStorage::new()),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let store = Arc::new(SessionStore::new(storage, clock, self.session));

        let navigator: Arc<dyn Navigator> = match self.navigator {
            Some(navigator) => navigator,
            None => Arc::new(NoopNavigator),
        };

        SessionManager::from_parts(Parts {
            transport,
            store,
            idle: self.idle,
            activity: self.activity.unwrap_or_default(),
            notices: self.notices.unwrap_or_default(),
            navigator,
            endpoints: self.endpoints,
            recovery: self.recovery,
        })
    }

    /// Builds the manager over the reqwest-backed transport.
    ///
    /// # Errors
    /// Returns a transport error if the HTTP client can't be created
    /// (bad base URL), or any error of [`build`](Self::build).
    pub fn build_http(self, config: TransportConfig) -> Result<SessionManager<HttpTransport>, WardenError> {
        let transport = HttpTransport::new(config)?;
        self.build(transport)
    }
}

impl Default for SessionManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
