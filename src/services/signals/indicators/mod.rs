//! Technical indicator implementations.
//!
//! Every indicator produces a series shorter than its input. `IndicatorEngine`
//! right-aligns each series against the bars so the last value always belongs
//! to the last bar.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::Atr;
pub use ema::Ema;
pub use macd::Macd;
pub use rsi::Rsi;
pub use sma::Sma;

use crate::types::{IndicatorFrame, PriceBar};

/// Value of `series` for bar `index` out of `total` bars, if it exists.
pub fn aligned<T: Copy>(series: &[T], total: usize, index: usize) -> Option<T> {
    let offset = total.checked_sub(series.len())?;
    index.checked_sub(offset).and_then(|i| series.get(i)).copied()
}

/// Computes the full indicator set over a bar history.
#[derive(Default)]
pub struct IndicatorEngine;

impl IndicatorEngine {
    pub fn new() -> Self {
        Self
    }

    /// One frame per bar, in input order. Fields without enough history stay `None`.
    pub fn enrich(&self, bars: &[PriceBar]) -> Vec<IndicatorFrame> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let total = bars.len();

        let sma20 = Sma::new(20).series(&closes);
        let sma50 = Sma::new(50).series(&closes);
        let sma200 = Sma::new(200).series(&closes);
        let ema50 = Ema::new(50).series(&closes);
        let rsi14 = Rsi::default().series(&closes);
        let macd = Macd::default().series(&closes);
        let atr = Atr::default().series(bars);

        bars.iter()
            .enumerate()
            .map(|(i, bar)| IndicatorFrame {
                bar: bar.clone(),
                sma20: aligned(&sma20, total, i),
                sma50: aligned(&sma50, total, i),
                sma200: aligned(&sma200, total, i),
                ema50: aligned(&ema50, total, i),
                rsi14: aligned(&rsi14, total, i),
                macd: aligned(&macd, total, i),
                // Bars before the first true ATR fall back to their own range
                atr: Some(aligned(&atr, total, i).unwrap_or_else(|| bar.range())),
            })
            .collect()
    }
}
