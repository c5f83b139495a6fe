//! Simple Moving Average (SMA) indicator.

/// SMA (Simple Moving Average) indicator.
///
/// Average close over a trailing window. The series has
/// `values.len() - period + 1` entries; the last one covers the last
/// `period` values.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn min_periods(&self) -> usize {
        self.period
    }

    /// Rolling mean over every full window of `values`.
    pub fn series(&self, values: &[f64]) -> Vec<f64> {
        if self.period == 0 || values.len() < self.period {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(values.len() - self.period + 1);
        let mut window_sum: f64 = values.iter().take(self.period).sum();
        out.push(window_sum / self.period as f64);

        for i in self.period..values.len() {
            window_sum += values[i] - values[i - self.period];
            out.push(window_sum / self.period as f64);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_series_length() {
        let values: Vec<f64> = (1..=30).map(|v| v as f64).collect();
        let sma = Sma::new(20).series(&values);
        assert_eq!(sma.len(), 11);
    }

    #[test]
    fn test_sma_values() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let sma = Sma::new(3).series(&values);
        assert_eq!(sma, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let values = vec![1.0, 2.0];
        assert!(Sma::new(3).series(&values).is_empty());
        assert_eq!(Sma::new(3).min_periods(), 3);
    }
}
