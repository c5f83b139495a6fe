//! Shared per-symbol watchlist state.
//!
//! Every refresh track writes here through [`WatchlistCache::merge`]. A merge
//! only overwrites the fields the update carries; everything else keeps its
//! last known value.

use crate::types::{MergeOutcome, WatchlistChange, WatchlistEntry, WatchlistUpdate};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

/// Merge `update` into `old`.
///
/// A first sighting starts from the placeholder entry. Fields equal to the
/// cached value keep the cached `Arc`, so unchanged sub-objects stay
/// pointer-identical.
pub fn merge_entry(
    symbol: &str,
    old: Option<&WatchlistEntry>,
    update: &WatchlistUpdate,
) -> (WatchlistEntry, MergeOutcome) {
    let mut entry = match old {
        Some(existing) => existing.clone(),
        None => WatchlistEntry::placeholder(symbol),
    };
    let mut changed = false;

    if let Some(price) = update.price {
        if entry.price != Some(price) {
            entry.price = Some(price);
            changed = true;
        }
    }

    if let Some(rec) = &update.recommendation {
        if *entry.recommendation != *rec {
            entry.recommendation = Arc::new(rec.clone());
            changed = true;
        }
    }

    if let Some(sentiment) = &update.sentiment {
        if *entry.sentiment != *sentiment {
            entry.sentiment = Arc::new(sentiment.clone());
            changed = true;
        }
    }

    if let Some(insight) = &update.ai_insight {
        if entry.ai_insight.as_deref() != Some(insight) {
            entry.ai_insight = Some(Arc::new(insight.clone()));
            changed = true;
        }
    }

    let outcome = match (old, changed) {
        (None, _) => MergeOutcome::Inserted,
        (Some(_), true) => MergeOutcome::Updated,
        (Some(_), false) => MergeOutcome::Unchanged,
    };
    (entry, outcome)
}

/// Symbol-keyed watchlist cache shared by all refresh tracks.
pub struct WatchlistCache {
    entries: DashMap<String, WatchlistEntry>,
    tx: broadcast::Sender<WatchlistChange>,
}

impl WatchlistCache {
    pub fn new() -> Arc<Self> {
        let (tx, _) = broadcast::channel(1024);
        Arc::new(Self {
            entries: DashMap::new(),
            tx,
        })
    }

    /// Subscribe to merges that changed state.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchlistChange> {
        self.tx.subscribe()
    }

    /// Apply a partial update as one read-modify-write under the entry lock.
    pub fn merge(&self, symbol: &str, update: WatchlistUpdate) -> MergeOutcome {
        let key = symbol.to_uppercase();

        let outcome = match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let (merged, outcome) = merge_entry(&key, Some(occupied.get()), &update);
                if outcome == MergeOutcome::Updated {
                    occupied.insert(merged);
                }
                outcome
            }
            Entry::Vacant(vacant) => {
                let (merged, outcome) = merge_entry(&key, None, &update);
                vacant.insert(merged);
                outcome
            }
        };

        if outcome == MergeOutcome::Unchanged {
            trace!(symbol = %key, "Merge was a no-op");
        } else {
            // Ignore errors if no receivers
            let _ = self.tx.send(WatchlistChange {
                symbol: key,
                outcome,
            });
        }
        outcome
    }

    pub fn get(&self, symbol: &str) -> Option<WatchlistEntry> {
        self.entries
            .get(&symbol.to_uppercase())
            .map(|e| e.value().clone())
    }

    /// Copy of every entry, keyed by symbol.
    pub fn snapshot(&self) -> HashMap<String, WatchlistEntry> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    pub fn remove(&self, symbol: &str) -> Option<WatchlistEntry> {
        self.entries.remove(&symbol.to_uppercase()).map(|(_, e)| e)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AiInsight, SentimentLabel, SentimentResult, TradeRecommendation};

    fn long_rec() -> TradeRecommendation {
        TradeRecommendation {
            reason: "Uptrend, RSI Oversold".to_string(),
            action: crate::types::Action::Long,
            confidence: crate::types::Confidence::Medium,
            patterns: Vec::new(),
            stop_loss: Some(95.0),
            take_profit: Some(110.0),
        }
    }

    #[test]
    fn test_first_sighting_uses_placeholders() {
        let (entry, outcome) = merge_entry("AAPL", None, &WatchlistUpdate::price(190.0));
        assert_eq!(outcome, MergeOutcome::Inserted);
        assert_eq!(entry.price, Some(190.0));
        assert_eq!(entry.recommendation.reason, "Loading...");
        assert_eq!(entry.sentiment.label, SentimentLabel::Neutral);
        assert!(entry.ai_insight.is_none());
    }

    #[test]
    fn test_price_update_keeps_recommendation_identity() {
        let (first, _) = merge_entry(
            "AAPL",
            None,
            &WatchlistUpdate::price(190.0).with_recommendation(long_rec()),
        );
        let (second, outcome) = merge_entry("AAPL", Some(&first), &WatchlistUpdate::price(191.0));
        assert_eq!(outcome, MergeOutcome::Updated);
        assert_eq!(second.price, Some(191.0));
        assert!(Arc::ptr_eq(&first.recommendation, &second.recommendation));
        assert!(Arc::ptr_eq(&first.sentiment, &second.sentiment));
    }

    #[test]
    fn test_equal_values_are_no_ops() {
        let update = WatchlistUpdate::price(10.0)
            .with_recommendation(long_rec())
            .with_sentiment(SentimentResult::neutral());
        let (first, _) = merge_entry("X", None, &update);
        let (second, outcome) = merge_entry("X", Some(&first), &update);
        assert_eq!(outcome, MergeOutcome::Unchanged);
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first.recommendation, &second.recommendation));
    }

    #[test]
    fn test_cache_merge_is_idempotent() {
        let cache = WatchlistCache::new();
        let update = WatchlistUpdate::price(42.0).with_recommendation(long_rec());
        assert_eq!(cache.merge("msft", update.clone()), MergeOutcome::Inserted);
        let once = cache.snapshot();
        assert_eq!(cache.merge("MSFT", update), MergeOutcome::Unchanged);
        assert_eq!(cache.snapshot(), once);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_fields_never_erase() {
        let cache = WatchlistCache::new();
        cache.merge(
            "TSLA",
            WatchlistUpdate::default()
                .with_recommendation(long_rec())
                .with_ai_insight(AiInsight {
                    score: 7.0,
                    summary: "Upbeat".to_string(),
                    reasoning: "Strong deliveries".to_string(),
                }),
        );
        cache.merge("TSLA", WatchlistUpdate::price(250.0));
        cache.merge("TSLA", WatchlistUpdate::default());
        let entry = cache.get("tsla").unwrap();
        assert_eq!(entry.price, Some(250.0));
        assert_eq!(*entry.recommendation, long_rec());
        assert_eq!(entry.ai_insight.unwrap().score, 7.0);
    }

    #[tokio::test]
    async fn test_subscribe_only_sees_changes() {
        let cache = WatchlistCache::new();
        let mut rx = cache.subscribe();
        cache.merge("NVDA", WatchlistUpdate::price(100.0));
        cache.merge("NVDA", WatchlistUpdate::price(100.0));
        cache.merge("NVDA", WatchlistUpdate::price(101.0));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.outcome, MergeOutcome::Inserted);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.outcome, MergeOutcome::Updated);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_remove() {
        let cache = WatchlistCache::new();
        cache.merge("AMD", WatchlistUpdate::price(1.0));
        assert!(cache.remove("amd").is_some());
        assert!(cache.is_empty());
    }
}
