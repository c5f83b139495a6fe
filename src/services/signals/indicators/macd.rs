//! MACD (Moving Average Convergence Divergence) indicator.

use super::Ema;
use crate::types::MacdValue;

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }

    /// Bars needed before the MACD line exists.
    pub fn min_periods(&self) -> usize {
        self.slow_period
    }

    /// MACD series with `values.len() - slow_period + 1` entries.
    ///
    /// The first `signal_period - 1` entries carry only the line.
    pub fn series(&self, values: &[f64]) -> Vec<MacdValue> {
        if self.fast_period >= self.slow_period || values.len() < self.min_periods() {
            return Vec::new();
        }

        let fast_ema = Ema::new(self.fast_period).series(values);
        let slow_ema = Ema::new(self.slow_period).series(values);

        // Align the EMAs (fast starts earlier)
        let offset = self.slow_period - self.fast_period;
        let macd_line: Vec<f64> = fast_ema
            .iter()
            .skip(offset)
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        let signal_line = Ema::new(self.signal_period).series(&macd_line);
        let signal_offset = macd_line.len() - signal_line.len();

        macd_line
            .iter()
            .enumerate()
            .map(|(i, &line)| {
                let signal = i
                    .checked_sub(signal_offset)
                    .and_then(|j| signal_line.get(j))
                    .copied();
                MacdValue {
                    line,
                    signal,
                    histogram: signal.map(|s| line - s),
                }
            })
            .collect()
    }
}
