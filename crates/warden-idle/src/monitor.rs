//! The inactivity monitor.
//!
//! One deadline, re-armed on every activity pulse. If the deadline is
//! reached the `on_timeout` callback runs once and the monitor stops.
//!
//! # Single timer
//!
//! The deadline lives in one `Option` slot behind a mutex. Arming always
//! aborts whatever is in the slot before spawning the replacement, and
//! each armed task carries a generation number. A task whose generation
//! no longer matches the slot (because it lost a race with a re-arm)
//! does nothing when it wakes. So however many pulses arrive, at most
//! one deadline can ever fire.
//!
//! # Runtime
//!
//! Pulses may come from threads that are not part of any Tokio runtime
//! (a native UI event loop, for instance). `start()` records the handle
//! of the runtime it runs on, and re-arms from such threads spawn onto
//! that handle. The old deadline is only aborted once its replacement
//! exists.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};
use warden_session::SessionStore;

use crate::{ActivityHub, ActivitySubscription, IdleConfig};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

struct Deadline {
    generation: u64,
    at: Instant,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct MonitorState {
    deadline: Option<Deadline>,
    subscription: Option<ActivitySubscription>,
    last_activity: Option<Instant>,
    runtime: Option<Handle>,
    generation: u64,
    timeouts_fired: u64,
}

struct Shared {
    config: IdleConfig,
    store: Arc<SessionStore>,
    hub: ActivityHub,
    on_timeout: Box<dyn Fn() + Send + Sync>,
    state: Mutex<MonitorState>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_activity(self: &Arc<Self>) {
        if !self.store.is_valid() {
            trace!("activity ignored, no valid session");
            return;
        }
        let mut state = self.state();
        self.arm(&mut state);
    }

    /// Arms a fresh deadline, then cancels the one it replaces.
    ///
    /// Runs on the current runtime if there is one, else on the runtime
    /// recorded by `start()`. With neither, the pending deadline is kept.
    fn arm(self: &Arc<Self>, state: &mut MonitorState) {
        let runtime = match Handle::try_current() {
            Ok(current) => current,
            Err(_) => match &state.runtime {
                Some(recorded) => recorded.clone(),
                None => {
                    warn!("no Tokio runtime to arm the inactivity deadline on");
                    return;
                }
            },
        };
        // Entering makes `Instant::now` read this runtime's clock.
        let _enter = runtime.enter();

        let generation = state.generation + 1;
        let now = Instant::now();
        let at = now + self.config.timeout;

        let weak = Arc::downgrade(self);
        let handle = runtime.spawn(async move {
            time::sleep_until(at).await;
            if let Some(shared) = weak.upgrade() {
                shared.fire(generation);
            }
        });

        state.generation = generation;
        let previous = state.deadline.replace(Deadline {
            generation,
            at,
            handle,
        });
        if let Some(previous) = previous {
            previous.handle.abort();
        }
        state.last_activity = Some(now);
        trace!(generation, "inactivity deadline armed");
    }

    fn fire(&self, generation: u64) {
        {
            let mut state = self.state();
            match &state.deadline {
                Some(deadline) if deadline.generation == generation => {}
                _ => {
                    trace!(generation, "stale deadline woke, ignoring");
                    return;
                }
            }
            // The handle belongs to the task running this code; drop it
            // without aborting.
            state.deadline = None;
            state.subscription = None;
            state.last_activity = None;
            state.timeouts_fired += 1;
        }

        warn!(
            timeout_s = self.config.timeout.as_secs(),
            "inactivity timeout reached, ending session"
        );
        (self.on_timeout)();
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(deadline) = state.deadline.take() {
            deadline.handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// InactivityMonitor
// ---------------------------------------------------------------------------

/// Ends the session after a span with no activity pulses.
///
/// Cheap to clone; clones drive the same monitor.
///
/// ```text
/// start() ──→ [armed] ──pulse──→ [re-armed] ──timeout──→ on_timeout() ──→ [stopped]
///                 │
///                 └──stop()──→ [stopped]
/// ```
#[derive(Clone)]
pub struct InactivityMonitor {
    shared: Arc<Shared>,
}

impl InactivityMonitor {
    /// Creates a stopped monitor.
    ///
    /// `on_timeout` runs (once per armed cycle) when the deadline is
    /// reached. It is called with no monitor lock held, so it may call
    /// back into the monitor.
    pub fn new(
        config: IdleConfig,
        store: Arc<SessionStore>,
        hub: ActivityHub,
        on_timeout: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config: config.validated(),
                store,
                hub,
                on_timeout: Box::new(on_timeout),
                state: Mutex::new(MonitorState::default()),
            }),
        }
    }

    /// Subscribes to activity pulses and arms the deadline.
    ///
    /// Does nothing when there is no valid session. Calling `start` on a
    /// running monitor replaces its subscription instead of adding a
    /// second one, and re-arms the deadline.
    ///
    /// Must be called within a Tokio runtime; later pulses from other
    /// threads arm their deadlines on it.
    pub fn start(&self) {
        if !self.shared.store.is_valid() {
            debug!("no valid session, inactivity monitor not started");
            return;
        }

        let mut state = self.shared.state();
        state.subscription = None;
        if let Ok(runtime) = Handle::try_current() {
            state.runtime = Some(runtime);
        }

        let weak = Arc::downgrade(&self.shared);
        state.subscription = Some(self.shared.hub.listen(move || {
            if let Some(shared) = weak.upgrade() {
                shared.on_activity();
            }
        }));
        self.shared.arm(&mut state);

        info!(
            timeout_s = self.shared.config.timeout.as_secs(),
            "inactivity monitor started"
        );
    }

    /// Records activity: if the session is valid, cancels the pending
    /// deadline and arms a new one a full timeout from now.
    ///
    /// May be called from any thread once the monitor has started.
    pub fn on_activity(&self) {
        self.shared.on_activity();
    }

    /// Cancels the pending deadline and releases the activity
    /// subscription. Safe to call at any time, any number of times.
    pub fn stop(&self) {
        let mut state = self.shared.state();
        let was_running = state.deadline.is_some() || state.subscription.is_some();

        if let Some(deadline) = state.deadline.take() {
            deadline.handle.abort();
        }
        state.subscription = None;
        state.last_activity = None;

        if was_running {
            debug!("inactivity monitor stopped");
        }
    }

    /// Time left before the deadline, for display. Zero when stopped.
    pub fn remaining(&self) -> Duration {
        match self.shared.state().last_activity {
            Some(last) => self.shared.config.timeout.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// The instant the pending deadline fires, if one is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.shared.state().deadline.as_ref().map(|d| d.at)
    }

    /// Number of armed deadlines: 0 or 1.
    pub fn pending_deadlines(&self) -> usize {
        usize::from(self.shared.state().deadline.is_some())
    }

    /// Whether a deadline is armed or an activity subscription is held.
    pub fn is_running(&self) -> bool {
        let state = self.shared.state();
        state.deadline.is_some() || state.subscription.is_some()
    }

    /// How many times the timeout has fired over the monitor's life.
    pub fn timeouts_fired(&self) -> u64 {
        self.shared.state().timeouts_fired
    }

    pub fn config(&self) -> &IdleConfig {
        &self.shared.config
    }
}

impl std::fmt::Debug for InactivityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InactivityMonitor")
            .field("timeout", &self.shared.config.timeout)
            .field("running", &self.is_running())
            .finish()
    }
}
