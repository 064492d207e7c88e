//! Activity pulses.
//!
//! The UI layer knows about pointer moves, key presses, touches and
//! scrolls. The monitor doesn't: it only needs to hear "something
//! happened". [`ActivityHub`] is the meeting point. The UI calls
//! [`pulse`](ActivityHub::pulse), listeners registered with
//! [`listen`](ActivityHub::listen) are called.
//!
//! Registration returns an [`ActivitySubscription`]. Dropping it removes
//! the listener, so a monitor that is stopped (or dropped) can never
//! leave a stale listener behind.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::trace;

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct HubInner {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, Listener>>,
}

impl HubInner {
    fn listeners(&self) -> MutexGuard<'_, HashMap<u64, Listener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A cloneable broadcaster of activity pulses.
///
/// Clones share the same listener set.
#[derive(Clone, Default)]
pub struct ActivityHub {
    inner: Arc<HubInner>,
}

impl ActivityHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals user activity to every listener. Returns how many were
    /// notified.
    ///
    /// Listeners run on the caller's thread, after the listener set has
    /// been snapshotted, so a listener may safely subscribe or
    /// unsubscribe while being called.
    pub fn pulse(&self) -> usize {
        let snapshot: Vec<Listener> = self.inner.listeners().values().cloned().collect();
        for listener in &snapshot {
            listener();
        }
        trace!(listeners = snapshot.len(), "activity pulse");
        snapshot.len()
    }

    /// Registers `listener`. It stays registered until the returned
    /// subscription is dropped.
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn listen(&self, listener: impl Fn() + Send + Sync + 'static) -> ActivitySubscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners().insert(id, Arc::new(listener));
        ActivitySubscription {
            id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners().len()
    }
}

impl std::fmt::Debug for ActivityHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Keeps a listener registered on an [`ActivityHub`]. Unregisters on drop.
#[derive(Debug)]
pub struct ActivitySubscription {
    id: u64,
    hub: Weak<HubInner>,
}

impl Drop for ActivitySubscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.listeners().remove(&self.id);
        }
    }
}
