use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration for the inactivity monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleConfig {
    /// How long the user may be idle before the session is force-ended.
    /// Default: 30 minutes.
    pub timeout: Duration,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl IdleConfig {
    /// Smallest accepted timeout. A zero timeout would log the user out
    /// the instant they signed in.
    pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`InactivityMonitor::new`](crate::InactivityMonitor::new).
    pub fn validated(mut self) -> Self {
        if self.timeout < Self::MIN_TIMEOUT {
            warn!(
                timeout = ?self.timeout,
                min = ?Self::MIN_TIMEOUT,
                "idle timeout below minimum, clamping"
            );
            self.timeout = Self::MIN_TIMEOUT;
        }
        self
    }
}
