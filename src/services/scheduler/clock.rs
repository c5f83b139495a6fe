use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Time source for the refresh tracks.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Wall-clock time stamped on published snapshots.
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day used to build history requests.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Monotonic time used for cache expiry.
    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the system time and the tokio timer.
///
/// Under `tokio::time::pause` sleeps follow the paused clock, which is how the
/// scheduler tests drive intervals.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
