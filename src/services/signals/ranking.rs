//! Watchlist ordering for display.
//!
//! Nothing here feeds back into the signal decision.

use crate::types::{Action, Asset, CategoryFilter, Confidence, TradeRecommendation, WatchlistEntry};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Sort weights for the recommendation ordering. Higher sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    pub strong_long: f64,
    pub strong_short: f64,
    pub long: f64,
    pub short: f64,
    pub wait: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            strong_long: 5.0,
            strong_short: 4.0,
            long: 3.0,
            short: 2.0,
            wait: 1.0,
        }
    }
}

impl RankingWeights {
    /// Parse `"strong_long,strong_short,long,short,wait"`.
    pub fn parse(s: &str) -> Option<Self> {
        let values: Vec<f64> = s
            .split(',')
            .map(|v| v.trim().parse::<f64>().ok())
            .collect::<Option<Vec<_>>>()?;
        match values.as_slice() {
            [strong_long, strong_short, long, short, wait] => Some(Self {
                strong_long: *strong_long,
                strong_short: *strong_short,
                long: *long,
                short: *short,
                wait: *wait,
            }),
            _ => None,
        }
    }

    /// Weight of a single recommendation.
    pub fn weight(&self, rec: &TradeRecommendation) -> f64 {
        match (rec.action, rec.confidence) {
            (Action::Long, Confidence::High) => self.strong_long,
            (Action::Short, Confidence::High) => self.strong_short,
            (Action::Long, _) => self.long,
            (Action::Short, _) => self.short,
            (Action::Wait, _) => self.wait,
        }
    }
}

/// Agreement between technicals and news, in either direction.
pub fn combined_opportunity_score(rec: &TradeRecommendation, sentiment_score: f64) -> f64 {
    (rec.directional_score() + sentiment_score).abs()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortOption {
    Symbol,
    Price,
    Sentiment,
    Recommendation,
    #[default]
    Combined,
}

impl SortOption {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "symbol" => Some(Self::Symbol),
            "price" => Some(Self::Price),
            "sentiment" => Some(Self::Sentiment),
            "recommendation" | "signal" => Some(Self::Recommendation),
            "combined" => Some(Self::Combined),
            _ => None,
        }
    }
}

/// Assets in `category` whose symbol or name contains `query`.
pub fn filter_assets(assets: &[Asset], category: CategoryFilter, query: &str) -> Vec<Asset> {
    let query = query.trim();
    assets
        .iter()
        .filter(|a| category.matches(a.category))
        .filter(|a| query.is_empty() || a.matches_query(query))
        .cloned()
        .collect()
}

fn sort_key(entry: &WatchlistEntry, option: SortOption, weights: &RankingWeights) -> f64 {
    match option {
        SortOption::Price => entry.price.unwrap_or(f64::NEG_INFINITY),
        SortOption::Sentiment => entry.sentiment.score,
        SortOption::Recommendation => weights.weight(&entry.recommendation),
        SortOption::Combined => {
            combined_opportunity_score(&entry.recommendation, entry.sentiment.score)
        }
        SortOption::Symbol => 0.0,
    }
}

/// Order `assets` for display.
///
/// Symbol order is ascending; every other option is descending by its key.
/// Assets with no cached entry yet go last, keeping their relative order.
pub fn sort_assets(
    assets: Vec<Asset>,
    entries: &HashMap<String, WatchlistEntry>,
    option: SortOption,
    weights: &RankingWeights,
) -> Vec<Asset> {
    if option == SortOption::Symbol {
        let mut assets = assets;
        assets.sort_by_key(|a| a.symbol.to_uppercase());
        return assets;
    }

    let (mut ranked, pending): (Vec<(f64, Asset)>, Vec<(f64, Asset)>) = assets
        .into_iter()
        .map(|asset| match entries.get(&asset.symbol.to_uppercase()) {
            Some(entry) => (sort_key(entry, option, weights), asset),
            None => (f64::NAN, asset),
        })
        .partition(|(key, _)| !key.is_nan());

    ranked.sort_by(|(ka, _), (kb, _)| kb.partial_cmp(ka).unwrap_or(Ordering::Equal));

    ranked
        .into_iter()
        .chain(pending)
        .map(|(_, asset)| asset)
        .collect()
}

/// Filter then sort, the way the dashboard list is built.
pub fn rank_watchlist(
    assets: &[Asset],
    entries: &HashMap<String, WatchlistEntry>,
    category: CategoryFilter,
    query: &str,
    option: SortOption,
    weights: &RankingWeights,
) -> Vec<Asset> {
    sort_assets(filter_assets(assets, category, query), entries, option, weights)
}
