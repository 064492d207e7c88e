//! User-facing notices and the single-slot broker that shows them.
//!
//! A notice is a transient banner ("your account is suspended", "server
//! unreachable"), distinct from inline form errors. Only one is ever
//! current: showing a new one replaces the old one and its auto-dismiss
//! timer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// Severity, for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub kind: NoticeKind,
    /// Auto-dismiss after this long. `Duration::ZERO` stays until hidden.
    pub duration: Duration,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            duration: Duration::ZERO,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// The notice shown when the server reports the account suspended.
    pub fn account_suspended(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Warning, "Account suspended", message)
    }

    /// The notice shown when the server can't be reached.
    pub fn connection_lost() -> Self {
        Self::new(
            NoticeKind::Error,
            "Connection lost",
            "The server could not be reached. Please sign in again.",
        )
    }
}

// ---------------------------------------------------------------------------
// NotificationBroker
// ---------------------------------------------------------------------------

struct Dismissal {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct SlotState {
    dismissal: Option<Dismissal>,
    generation: u64,
}

struct BrokerInner {
    current: watch::Sender<Option<Notice>>,
    slot: Mutex<SlotState>,
    /// The runtime the broker was created on, for `show` calls made
    /// from threads outside it.
    runtime: Option<Handle>,
}

impl BrokerInner {
    fn slot(&self) -> MutexGuard<'_, SlotState> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dismiss(&self, generation: u64) {
        let mut slot = self.slot();
        match &slot.dismissal {
            Some(d) if d.generation == generation => slot.dismissal = None,
            _ => return,
        }
        self.current.send_replace(None);
        trace!(generation, "notice auto-dismissed");
    }
}

impl Drop for BrokerInner {
    fn drop(&mut self) {
        let slot = self.slot.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(dismissal) = slot.dismissal.take() {
            dismissal.handle.abort();
        }
    }
}

/// Single-slot notice broadcaster.
///
/// Cheap to clone; clones share the slot. Observers read
/// [`current`](Self::current) or [`subscribe`](Self::subscribe).
#[derive(Clone)]
pub struct NotificationBroker {
    inner: Arc<BrokerInner>,
}

impl Default for NotificationBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBroker {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(BrokerInner {
                current,
                slot: Mutex::new(SlotState::default()),
                runtime: Handle::try_current().ok(),
            }),
        }
    }

    /// Makes `notice` the current notice, replacing any other.
    ///
    /// A pending auto-dismiss from an earlier notice is cancelled. If
    /// `notice.duration` is non-zero a new one is armed on the current
    /// runtime, or on the one the broker was created on. With neither,
    /// the notice stays until hidden.
    pub fn show(&self, notice: Notice) {
        let mut slot = self.inner.slot();
        if let Some(previous) = slot.dismissal.take() {
            previous.handle.abort();
        }
        slot.generation += 1;
        let generation = slot.generation;
        let duration = notice.duration;

        debug!(title = %notice.title, kind = ?notice.kind, ?duration, "showing notice");
        self.inner.current.send_replace(Some(notice));

        if duration.is_zero() {
            return;
        }
        let runtime = match Handle::try_current() {
            Ok(current) => current,
            Err(_) => match &self.inner.runtime {
                Some(recorded) => recorded.clone(),
                None => {
                    warn!("no Tokio runtime to arm the notice auto-dismiss on");
                    return;
                }
            },
        };
        let weak: Weak<BrokerInner> = Arc::downgrade(&self.inner);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = weak.upgrade() {
                inner.dismiss(generation);
            }
        });
        slot.dismissal = Some(Dismissal { generation, handle });
    }

    /// Clears the current notice and cancels its auto-dismiss.
    /// Does nothing if no notice is shown.
    pub fn hide(&self) {
        let mut slot = self.inner.slot();
        if let Some(dismissal) = slot.dismissal.take() {
            dismissal.handle.abort();
        }
        let cleared = self.inner.current.send_if_modified(|current| current.take().is_some());
        if cleared {
            debug!("notice hidden");
        }
    }

    /// The notice on screen right now.
    pub fn current(&self) -> Option<Notice> {
        self.inner.current.borrow().clone()
    }

    /// Change notifications for the current notice.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notice>> {
        self.inner.current.subscribe()
    }

    /// Number of armed auto-dismiss timers: 0 or 1.
    pub fn pending_dismissals(&self) -> usize {
        usize::from(self.inner.slot().dismissal.is_some())
    }
}

impl std::fmt::Debug for NotificationBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBroker")
            .field("current", &self.current())
            .finish()
    }
}
