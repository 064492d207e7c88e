//! Carrying out a [`Classification`].
//!
//! The recovery crate doesn't own the session, the navigator or the
//! notice slot. It drives them through [`RecoveryHooks`], which the
//! façade implements.

use std::time::Duration;

use tracing::warn;

use crate::{Classification, Notice, RecoveryAction};

/// The side effects a recovery flow may need.
pub trait RecoveryHooks {
    /// Clears the session, stops timers, and navigates to login now.
    fn force_logout(&self);

    /// Clears the session and stops timers, without navigating.
    fn reset_session(&self);

    /// Shows a notice to the user.
    fn show_notice(&self, notice: Notice);

    /// Navigates to login once `delay` has passed.
    fn redirect_to_login_after(&self, delay: Duration);
}

/// Runs the action attached to `classification`.
///
/// For reset-and-redirect flows the order is fixed: session state is
/// reset first, then the notice is shown, then the redirect is
/// scheduled.
pub fn apply(classification: &Classification, hooks: &impl RecoveryHooks) {
    match &classification.action {
        RecoveryAction::ForceLogout => {
            warn!(
                kind = %classification.kind,
                status = classification.status,
                "request rejected, forcing logout"
            );
            hooks.force_logout();
        }
        RecoveryAction::ResetAndRedirect {
            notice,
            redirect_after,
        } => {
            warn!(
                kind = %classification.kind,
                status = classification.status,
                ?redirect_after,
                "resetting session, redirecting to login"
            );
            hooks.reset_session();
            hooks.show_notice(notice.clone());
            hooks.redirect_to_login_after(*redirect_after);
        }
        RecoveryAction::None => {}
    }
}
