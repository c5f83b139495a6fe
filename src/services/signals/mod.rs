//! Trading signals service module.
//!
//! Provides technical indicator calculations, candlestick pattern detection,
//! headline sentiment scoring and the trade recommendation built from them.

pub mod engine;
pub mod indicators;
pub mod patterns;
pub mod ranking;
pub mod sentiment;

pub use engine::SignalEngine;
pub use indicators::IndicatorEngine;
pub use patterns::{PatternDetector, PatternOutcome};
pub use ranking::{RankingWeights, SortOption};
pub use sentiment::SentimentScorer;

use crate::types::{IndicatorFrame, PriceBar, SentimentLabel, TradeRecommendation, TradingMode};
use serde::{Deserialize, Serialize};

/// Enriched history plus the recommendation computed from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalAnalysis {
    pub frames: Vec<IndicatorFrame>,
    pub recommendation: TradeRecommendation,
}

impl SignalAnalysis {
    pub fn latest(&self) -> Option<&IndicatorFrame> {
        self.frames.last()
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.latest().map(|f| f.close())
    }
}

/// Full pipeline: indicators, patterns on the latest bar, then the decision.
pub fn analyze(bars: &[PriceBar], mode: TradingMode, sentiment: SentimentLabel) -> SignalAnalysis {
    let frames = IndicatorEngine::new().enrich(bars);
    let patterns = PatternDetector::new().detect(&frames);
    let recommendation = SignalEngine::new().evaluate(&frames, &patterns, mode, sentiment);
    SignalAnalysis {
        frames,
        recommendation,
    }
}
