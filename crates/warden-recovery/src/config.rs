//! Recovery configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing of the suspension and connectivity flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// How long the suspension/connectivity notice stays visible.
    pub notice_duration: Duration,

    /// Delay between resetting the session and navigating to login.
    /// Matches the notice duration by default, so the user can read it.
    pub redirect_delay: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            notice_duration: Duration::from_secs(4),
            redirect_delay: Duration::from_secs(4),
        }
    }
}

impl RecoveryConfig {
    /// Sets both the notice duration and the redirect delay.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            notice_duration: delay,
            redirect_delay: delay,
        }
    }
}
