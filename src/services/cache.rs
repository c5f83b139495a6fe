use crate::services::scheduler::clock::{Clock, TokioClock};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A thread-safe keyed cache with optional expiry.
///
/// Backs the last-known focused analysis (keyed `SYMBOL:mode`) and the AI
/// insights (keyed by headline-set hash). Expiry reads the monotonic time of
/// the injected [`Clock`].
pub struct Cache<V> {
    data: DashMap<String, CacheEntry<V>>,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
}

struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

impl<V: Clone> Cache<V> {
    /// Cache whose entries expire `ttl` after being written, as seen by `clock`.
    pub fn with_ttl(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            data: DashMap::new(),
            ttl: Some(ttl),
            clock,
        }
    }

    /// Cache whose entries never expire.
    pub fn unbounded() -> Self {
        Self {
            data: DashMap::new(),
            ttl: None,
            clock: Arc::new(TokioClock),
        }
    }

    /// Build the `SYMBOL:mode` key used for per-mode analyses.
    pub fn key(symbol: &str, mode: impl std::fmt::Display) -> String {
        format!("{}:{}", symbol.to_uppercase(), mode)
    }

    /// Get a live value. Expired entries are dropped on read.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.data.get(key)?;
        if entry.is_live(self.clock.instant()) {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.data.remove(key);
            None
        }
    }

    pub fn insert(&self, key: String, value: V) {
        let expires_at = self.ttl.map(|ttl| self.clock.instant() + ttl);
        self.data.insert(key, CacheEntry { value, expires_at });
    }

    /// Remove all expired entries. Returns how many were dropped.
    pub fn cleanup(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = self.clock.instant();
        let before = self.data.len();
        self.data.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.data.len())
    }
}
