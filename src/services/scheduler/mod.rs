//! Multi-cadence refresh scheduler.
//!
//! A [`DashboardSession`] owns one job per refresh track. Tracks share the
//! watchlist cache and publish the focused symbol's state on a watch channel.

pub mod clock;
pub mod jobs;
pub mod session;
pub mod tracks;

pub use clock::{Clock, TokioClock};
pub use jobs::{JobRegistry, Track};
pub use session::{DashboardSession, FocusedSnapshot, SessionProviders, SessionState};
