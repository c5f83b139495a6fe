use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate news sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl SentimentLabel {
    /// Label for an aggregate score: >= +1 Bullish, <= -1 Bearish.
    pub fn from_score(score: f64) -> Self {
        if score >= 1.0 {
            SentimentLabel::Bullish
        } else if score <= -1.0 {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// Classification of a single headline from its own subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadlineSentiment {
    Positive,
    Negative,
    Neutral,
}

impl HeadlineSentiment {
    pub fn from_subtotal(subtotal: i32) -> Self {
        match subtotal {
            s if s > 0 => HeadlineSentiment::Positive,
            s if s < 0 => HeadlineSentiment::Negative,
            _ => HeadlineSentiment::Neutral,
        }
    }
}

/// Result of scoring a set of headlines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    /// Average weight per matching headline.
    pub score: f64,
    pub label: SentimentLabel,
    pub summary: String,
    /// Headlines that matched at least one keyword.
    #[serde(default)]
    pub details: BTreeMap<String, HeadlineSentiment>,
}

impl SentimentResult {
    /// Placeholder for a symbol without any sentiment yet.
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
            summary: String::new(),
            details: BTreeMap::new(),
        }
    }
}

impl Default for SentimentResult {
    fn default() -> Self {
        Self::neutral()
    }
}
