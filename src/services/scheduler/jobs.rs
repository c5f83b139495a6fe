//! Named, cancellable background jobs.
//!
//! Every job runs under a child of the session token, so cancelling the
//! session stops all of them while a single job can be restarted on its own.

use super::clock::Clock;
use async_trait::async_trait;
use dashmap::DashMap;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A repeating unit of work.
#[async_trait]
pub trait Track: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Delay between the end of one tick and the start of the next.
    fn interval(&self) -> Duration;

    /// One fetch-and-merge pass. Implementations check `token` before every mutation.
    async fn tick(&self, token: &CancellationToken);
}

/// Sleep for `duration` unless cancelled first. Returns false on cancellation.
pub async fn pause(token: &CancellationToken, clock: &dyn Clock, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = clock.sleep(duration) => true,
    }
}

/// Run `track` until cancelled. Ticks never overlap: the interval starts
/// after the previous tick has finished.
pub async fn run_track<T: Track>(track: T, token: CancellationToken, clock: std::sync::Arc<dyn Clock>) {
    debug!(job = track.name(), "Track loop started");
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = track.tick(&token) => {}
        }
        if !pause(&token, clock.as_ref(), track.interval()).await {
            break;
        }
    }
    debug!(job = track.name(), "Track loop stopped");
}

struct Job {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Registry of running jobs keyed by name.
pub struct JobRegistry {
    root: CancellationToken,
    jobs: DashMap<&'static str, Job>,
}

impl JobRegistry {
    pub fn new(root: CancellationToken) -> Self {
        Self {
            root,
            jobs: DashMap::new(),
        }
    }

    /// Start `name`, cancelling any job already registered under it.
    pub fn spawn<F, Fut>(&self, name: &'static str, job: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.root.is_cancelled() {
            debug!(job = name, "Session closed, not starting job");
            return;
        }

        let token = self.root.child_token();
        let handle = tokio::spawn(job(token.clone()));

        if let Some(previous) = self.jobs.insert(name, Job { token, handle }) {
            previous.token.cancel();
            info!(job = name, "Job restarted");
        } else {
            info!(job = name, "Job started");
        }
    }

    /// Cancel `name`. Returns false if no such job was registered.
    pub fn cancel(&self, name: &str) -> bool {
        match self.jobs.remove(name) {
            Some((_, job)) => {
                job.token.cancel();
                info!(job = name, "Job cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.jobs
            .get(name)
            .is_some_and(|job| !job.token.is_cancelled() && !job.handle.is_finished())
    }

    /// Names of running jobs, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .jobs
            .iter()
            .filter(|job| !job.token.is_cancelled() && !job.handle.is_finished())
            .map(|job| *job.key())
            .collect();
        names.sort_unstable();
        names
    }

    /// Cancel every job and wait for them to exit.
    pub async fn shutdown(&self) {
        self.root.cancel();
        let names: Vec<&'static str> = self.jobs.iter().map(|job| *job.key()).collect();
        for name in names {
            if let Some((_, job)) = self.jobs.remove(name) {
                let _ = job.handle.await;
            }
        }
        info!("All jobs stopped");
    }
}
