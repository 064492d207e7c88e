//! Inactivity timeout for Warden sessions.
//!
//! A signed-in user who stops interacting for [`IdleConfig::timeout`]
//! (30 minutes by default) is signed out. The pieces:
//!
//! - [`ActivityHub`]: the UI reports "something happened" here
//! - [`InactivityMonitor`]: holds the single pending deadline, re-arms
//!   it on every pulse, and calls back when it is reached
//!
//! # Integration
//!
//! The façade starts the monitor after login and stops it on logout:
//!
//! ```ignore
//! let monitor = InactivityMonitor::new(IdleConfig::default(), store, hub.clone(), move || {
//!     manager.force_logout();
//! });
//! monitor.start();
//! // ... UI event handlers:
//! hub.pulse();
//! ```

mod config;
mod hub;
mod monitor;

pub use config::IdleConfig;
pub use hub::{ActivityHub, ActivitySubscription};
pub use monitor::InactivityMonitor;
