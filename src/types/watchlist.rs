use crate::types::{AiInsight, SentimentResult, TradeRecommendation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Latest known state of one watchlist symbol.
///
/// Sub-objects are shared so an unchanged field keeps its identity across
/// merges and consumers can compare with `Arc::ptr_eq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub recommendation: Arc<TradeRecommendation>,
    pub sentiment: Arc<SentimentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_insight: Option<Arc<AiInsight>>,
}

impl WatchlistEntry {
    /// Entry for a symbol seen for the first time, with neutral placeholders.
    pub fn placeholder(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: None,
            recommendation: Arc::new(TradeRecommendation::loading()),
            sentiment: Arc::new(SentimentResult::neutral()),
            ai_insight: None,
        }
    }
}

/// Partial update for a watchlist entry. `None` means "keep previous".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchlistUpdate {
    pub price: Option<f64>,
    pub recommendation: Option<TradeRecommendation>,
    pub sentiment: Option<SentimentResult>,
    pub ai_insight: Option<AiInsight>,
}

impl WatchlistUpdate {
    pub fn price(price: f64) -> Self {
        Self {
            price: Some(price),
            ..Default::default()
        }
    }

    pub fn with_recommendation(mut self, recommendation: TradeRecommendation) -> Self {
        self.recommendation = Some(recommendation);
        self
    }

    pub fn with_sentiment(mut self, sentiment: SentimentResult) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_ai_insight(mut self, insight: AiInsight) -> Self {
        self.ai_insight = Some(insight);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.recommendation.is_none()
            && self.sentiment.is_none()
            && self.ai_insight.is_none()
    }
}

/// What a merge did to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Notification emitted for every merge that changed state.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchlistChange {
    pub symbol: String,
    pub outcome: MergeOutcome,
}
