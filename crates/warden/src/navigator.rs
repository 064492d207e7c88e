//! Navigation seam.
//!
//! The session layer decides *when* the user must go back to the login
//! screen; the application decides *how*. A [`Navigator`] is the
//! application's side of that contract.

use tokio::sync::mpsc;

/// Screens the session layer may send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
}

/// Performs navigation on behalf of the session layer.
///
/// Called synchronously from logout and recovery paths, so it must not
/// block.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, route: Route);
}

/// Ignores every navigation request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _route: Route) {}
}

/// Publishes navigation requests on a channel for the UI loop to drain.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: Route) {
        if self.tx.send(route).is_err() {
            tracing::debug!(?route, "navigation receiver dropped");
        }
    }
}
