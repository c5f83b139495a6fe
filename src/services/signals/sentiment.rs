//! Keyword-weighted headline sentiment.

use crate::types::{HeadlineSentiment, SentimentLabel, SentimentResult};
use std::collections::BTreeMap;

/// Lowercase keyword fragments and their weights. Fragments match anywhere in
/// the headline, so "optimis" covers optimism/optimistic.
pub const KEYWORD_WEIGHTS: &[(&str, i32)] = &[
    // Strong positive
    ("skyrocket", 3),
    ("surge", 3),
    ("record", 3),
    ("soar", 3),
    ("bull", 3),
    // Moderate positive
    ("jump", 2),
    ("gain", 2),
    ("beat", 2),
    ("strong", 2),
    ("growth", 2),
    ("profit", 2),
    ("upgrade", 2),
    // Weak positive
    ("up", 1),
    ("high", 1),
    ("buy", 1),
    ("optimis", 1),
    ("revenue", 1),
    // Strong negative
    ("crash", -3),
    ("plunge", -3),
    ("collapse", -3),
    ("bear", -3),
    ("recession", -3),
    ("panic", -3),
    // Moderate negative
    ("drop", -2),
    ("fall", -2),
    ("miss", -2),
    ("loss", -2),
    ("downgrade", -2),
    ("weak", -2),
    ("risk", -2),
    // Weak negative
    ("down", -1),
    ("low", -1),
    ("sell", -1),
    ("decline", -1),
    ("pessimis", -1),
    ("inflation", -1),
];

/// Scores headlines against a keyword table.
pub struct SentimentScorer {
    weights: &'static [(&'static str, i32)],
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self {
            weights: KEYWORD_WEIGHTS,
        }
    }
}

impl SentimentScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signed sum of all keywords found in `headline`, or `None` if nothing matched.
    pub fn score_headline(&self, headline: &str) -> Option<i32> {
        let lower = headline.to_lowercase();
        let mut matched = false;
        let mut subtotal = 0;
        for (keyword, weight) in self.weights {
            if lower.contains(keyword) {
                matched = true;
                subtotal += weight;
            }
        }
        matched.then_some(subtotal)
    }

    /// Average keyword score over the headlines that matched at least once.
    pub fn score<S: AsRef<str>>(&self, headlines: &[S]) -> SentimentResult {
        let mut total = 0i32;
        let mut relevant = 0usize;
        let mut details = BTreeMap::new();

        for headline in headlines {
            let headline = headline.as_ref();
            if let Some(subtotal) = self.score_headline(headline) {
                total += subtotal;
                relevant += 1;
                details.insert(
                    headline.to_string(),
                    HeadlineSentiment::from_subtotal(subtotal),
                );
            }
        }

        if relevant == 0 {
            return SentimentResult {
                summary: "No relevant sentiment detected.".to_string(),
                ..SentimentResult::neutral()
            };
        }

        let score = total as f64 / relevant as f64;
        SentimentResult {
            score,
            label: SentimentLabel::from_score(score),
            summary: format!("AI Score: {:.1} based on {} signals.", score, relevant),
            details,
        }
    }
}
