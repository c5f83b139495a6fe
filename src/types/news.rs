use crate::types::SentimentResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news headline from the news provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Provider-assigned article identifier.
    pub uuid: String,
    pub title: String,
    pub publisher: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Relevant headlines for a symbol plus their sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDigest {
    pub symbol: String,
    pub items: Vec<NewsItem>,
    pub sentiment: SentimentResult,
}

impl NewsDigest {
    /// Article identifiers in provider order.
    pub fn article_ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.uuid.as_str()).collect()
    }
}

/// Opaque deep-analysis result from the LLM collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiInsight {
    /// 1 (extremely bearish) to 10 (extremely bullish).
    pub score: f64,
    pub summary: String,
    pub reasoning: String,
}
