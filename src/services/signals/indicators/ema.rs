//! Exponential Moving Average (EMA) indicator.

/// EMA (Exponential Moving Average) indicator.
///
/// Like SMA but gives more weight to recent prices. Seeded with the SMA of
/// the first `period` values.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn min_periods(&self) -> usize {
        self.period
    }

    /// EMA series with `values.len() - period + 1` entries.
    pub fn series(&self, values: &[f64]) -> Vec<f64> {
        if self.period == 0 || values.len() < self.period {
            return Vec::new();
        }

        let multiplier = 2.0 / (self.period as f64 + 1.0);
        let mut out = Vec::with_capacity(values.len() - self.period + 1);

        // First EMA is SMA
        let mut ema: f64 = values.iter().take(self.period).sum::<f64>() / self.period as f64;
        out.push(ema);

        for value in values.iter().skip(self.period) {
            ema = (value - ema) * multiplier + ema;
            out.push(ema);
        }

        out
    }
}
