//! Average True Range (ATR) indicator.

use crate::types::PriceBar;

/// ATR (Average True Range) indicator.
///
/// Measures market volatility by calculating the average of true ranges:
/// TR = max(High-Low, |High-PrevClose|, |Low-PrevClose|)
pub struct Atr {
    period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn min_periods(&self) -> usize {
        self.period + 1
    }

    /// Calculate True Range.
    fn true_range(current: &PriceBar, previous: &PriceBar) -> f64 {
        let hl = current.high - current.low;
        let hc = (current.high - previous.close).abs();
        let lc = (current.low - previous.close).abs();
        hl.max(hc).max(lc)
    }

    /// Wilder-smoothed ATR series with `bars.len() - period` entries.
    pub fn series(&self, bars: &[PriceBar]) -> Vec<f64> {
        if self.period == 0 || bars.len() < self.min_periods() {
            return Vec::new();
        }

        let true_ranges: Vec<f64> = bars
            .windows(2)
            .map(|pair| Self::true_range(&pair[1], &pair[0]))
            .collect();

        let period = self.period as f64;
        let mut atr: f64 = true_ranges.iter().take(self.period).sum::<f64>() / period;

        let mut out = Vec::with_capacity(bars.len() - self.period);
        out.push(atr);
        for tr in true_ranges.iter().skip(self.period) {
            atr = (atr * (period - 1.0) + tr) / period;
            out.push(atr);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_candles(count: usize, spread: f64) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..count)
            .map(|i| {
                let base = 100.0 + i as f64;
                PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: base,
                    high: base + spread,
                    low: base - spread,
                    close: base,
                    volume: 1000.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_atr_series_length() {
        assert_eq!(Atr::default().series(&create_candles(30, 1.0)).len(), 16);
    }

    #[test]
    fn test_atr_constant_range() {
        // Range 2.0, gap to previous close 1.0 + 1.0 => TR = 2.0
        let atr = Atr::default().series(&create_candles(30, 1.0));
        assert!(atr.iter().all(|v| (v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_atr_insufficient_data() {
        assert!(Atr::default().series(&create_candles(14, 1.0)).is_empty());
        assert_eq!(Atr::default().min_periods(), 15);
    }

    #[test]
    fn test_atr_wider_spread_is_larger() {
        let narrow = Atr::new(5).series(&create_candles(20, 1.0));
        let wide = Atr::new(5).series(&create_candles(20, 3.0));
        assert!(wide.last().unwrap() > narrow.last().unwrap());
    }
}
