//! Candlestick pattern detection over the trailing bar window.
//!
//! Each detector looks at the bars ending at the most recent one. A detector
//! that cannot judge the window (too few bars, zero-range candles) reports
//! `Inapplicable`, which counts as "not detected".

use crate::types::{IndicatorFrame, PatternName, PriceBar};

/// Bars handed to the detectors.
pub const PATTERN_WINDOW: usize = 5;

/// Result of evaluating one detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOutcome {
    Match,
    NoMatch,
    Inapplicable,
}

impl PatternOutcome {
    pub fn detected(self) -> bool {
        self == PatternOutcome::Match
    }

    fn from_bool(matched: bool) -> Self {
        if matched {
            PatternOutcome::Match
        } else {
            PatternOutcome::NoMatch
        }
    }
}

/// A single candlestick pattern.
pub trait CandlePattern: Send + Sync {
    fn name(&self) -> PatternName;

    /// Bars the pattern spans, ending at the latest bar.
    fn min_bars(&self) -> usize;

    /// Evaluate against the window; the last bar is the one being judged.
    fn evaluate(&self, window: &[PriceBar]) -> PatternOutcome;
}

/// Last `n` bars of the window, or `None` if the window is shorter or any
/// bar in it has no range.
fn tail(window: &[PriceBar], n: usize) -> Option<&[PriceBar]> {
    let bars = window.get(window.len().checked_sub(n)?..)?;
    if bars.iter().any(|b| b.range() <= 0.0) {
        return None;
    }
    Some(bars)
}

fn midpoint(bar: &PriceBar) -> f64 {
    (bar.open + bar.close) / 2.0
}

fn is_long_body(bar: &PriceBar) -> bool {
    bar.body() >= bar.range() * 0.5
}

// ============================================================
// Two-bar patterns
// ============================================================

pub struct BullishEngulfing;

impl CandlePattern for BullishEngulfing {
    fn name(&self) -> PatternName {
        PatternName::BullishEngulfing
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn evaluate(&self, window: &[PriceBar]) -> PatternOutcome {
        let Some(bars) = tail(window, self.min_bars()) else {
            return PatternOutcome::Inapplicable;
        };
        let (prev, cur) = (&bars[0], &bars[1]);
        PatternOutcome::from_bool(
            prev.is_bearish()
                && prev.open > cur.open
                && prev.close > cur.open
                && prev.open < cur.close,
        )
    }
}

pub struct BearishEngulfing;

impl CandlePattern for BearishEngulfing {
    fn name(&self) -> PatternName {
        PatternName::BearishEngulfing
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn evaluate(&self, window: &[PriceBar]) -> PatternOutcome {
        let Some(bars) = tail(window, self.min_bars()) else {
            return PatternOutcome::Inapplicable;
        };
        let (prev, cur) = (&bars[0], &bars[1]);
        PatternOutcome::from_bool(
            prev.is_bullish()
                && prev.open < cur.open
                && prev.close < cur.open
                && prev.open > cur.close,
        )
    }
}

// ============================================================
// Single-bar patterns
// ============================================================

pub struct Hammer;

impl CandlePattern for Hammer {
    fn name(&self) -> PatternName {
        PatternName::Hammer
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn evaluate(&self, window: &[PriceBar]) -> PatternOutcome {
        let Some(bars) = tail(window, self.min_bars()) else {
            return PatternOutcome::Inapplicable;
        };
        let bar = &bars[0];
        let body = bar.body();
        PatternOutcome::from_bool(
            body > 0.0 && bar.lower_shadow() >= body * 2.0 && bar.upper_shadow() <= body,
        )
    }
}

pub struct ShootingStar;

impl CandlePattern for ShootingStar {
    fn name(&self) -> PatternName {
        PatternName::ShootingStar
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn evaluate(&self, window: &[PriceBar]) -> PatternOutcome {
        let Some(bars) = tail(window, self.min_bars()) else {
            return PatternOutcome::Inapplicable;
        };
        let bar = &bars[0];
        let body = bar.body();
        PatternOutcome::from_bool(
            body > 0.0 && bar.upper_shadow() >= body * 2.0 && bar.lower_shadow() <= body,
        )
    }
}

// ============================================================
// Three-bar patterns
// ============================================================

pub struct MorningStar;

impl CandlePattern for MorningStar {
    fn name(&self) -> PatternName {
        PatternName::MorningStar
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn evaluate(&self, window: &[PriceBar]) -> PatternOutcome {
        let Some(bars) = tail(window, self.min_bars()) else {
            return PatternOutcome::Inapplicable;
        };
        let (first, star, last) = (&bars[0], &bars[1], &bars[2]);
        PatternOutcome::from_bool(
            first.is_bearish()
                && is_long_body(first)
                && star.body() < first.body() * 0.5
                && star.open.max(star.close) < first.close
                && last.is_bullish()
                && last.close > midpoint(first),
        )
    }
}

pub struct EveningStar;

impl CandlePattern for EveningStar {
    fn name(&self) -> PatternName {
        PatternName::EveningStar
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn evaluate(&self, window: &[PriceBar]) -> PatternOutcome {
        let Some(bars) = tail(window, self.min_bars()) else {
            return PatternOutcome::Inapplicable;
        };
        let (first, star, last) = (&bars[0], &bars[1], &bars[2]);
        PatternOutcome::from_bool(
            first.is_bullish()
                && is_long_body(first)
                && star.body() < first.body() * 0.5
                && star.open.min(star.close) > first.close
                && last.is_bearish()
                && last.close < midpoint(first),
        )
    }
}

/// Runs the fixed detector set against the trailing window of a frame series.
pub struct PatternDetector {
    patterns: Vec<Box<dyn CandlePattern>>,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self {
            patterns: vec![
                Box::new(BullishEngulfing),
                Box::new(Hammer),
                Box::new(MorningStar),
                Box::new(BearishEngulfing),
                Box::new(ShootingStar),
                Box::new(EveningStar),
            ],
        }
    }
}

impl PatternDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome of every detector against the last `PATTERN_WINDOW` frames.
    pub fn evaluate(&self, frames: &[IndicatorFrame]) -> Vec<(PatternName, PatternOutcome)> {
        let start = frames.len().saturating_sub(PATTERN_WINDOW);
        let window: Vec<PriceBar> = frames[start..].iter().map(|f| f.bar.clone()).collect();

        self.patterns
            .iter()
            .map(|p| (p.name(), p.evaluate(&window)))
            .collect()
    }

    /// Names of the patterns that match on the most recent bar.
    pub fn detect(&self, frames: &[IndicatorFrame]) -> Vec<PatternName> {
        self.evaluate(frames)
            .into_iter()
            .filter(|(_, outcome)| outcome.detected())
            .map(|(name, _)| name)
            .collect()
    }
}
