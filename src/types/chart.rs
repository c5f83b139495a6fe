use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Calendar day (UTC), serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// High minus low of this bar.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Absolute body size.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Distance from the top of the body to the high.
    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Distance from the bottom of the body to the low.
    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }
}

/// MACD components for a single bar.
///
/// The signal line needs nine MACD values before it exists, so the first
/// frames carrying a MACD line have no signal or histogram yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdValue {
    pub line: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<f64>,
}

/// A price bar enriched with indicators.
///
/// Every indicator is `None` until the series has enough history for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorFrame {
    #[serde(flatten)]
    pub bar: PriceBar,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma20: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma50: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma200: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema50: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi14: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr: Option<f64>,
}

impl IndicatorFrame {
    /// A frame with no indicators attached.
    pub fn bare(bar: PriceBar) -> Self {
        Self {
            bar,
            sma20: None,
            sma50: None,
            sma200: None,
            ema50: None,
            rsi14: None,
            macd: None,
            atr: None,
        }
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }

    /// Calendar day formatted for display.
    pub fn date_label(&self) -> String {
        self.bar.date.format("%Y-%m-%d").to_string()
    }

    /// ATR, or the bar's own high-low range when ATR is not yet available.
    pub fn effective_atr(&self) -> f64 {
        self.atr.unwrap_or_else(|| self.bar.range())
    }

    /// MACD histogram, if the signal line exists for this bar.
    pub fn macd_histogram(&self) -> Option<f64> {
        self.macd.and_then(|m| m.histogram)
    }
}

/// Bar interval requested from a history provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BarInterval {
    #[default]
    Daily,
}

impl BarInterval {
    /// Interval token used by chart APIs.
    pub fn as_query(&self) -> &'static str {
        match self {
            BarInterval::Daily => "1d",
        }
    }
}

/// Date range request for a price history provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: BarInterval,
}

impl HistoryRequest {
    /// Daily bars covering the last `days` calendar days up to `today`.
    pub fn trailing_days(today: NaiveDate, days: u32) -> Self {
        Self {
            start: today - chrono::Duration::days(days as i64),
            end: today,
            interval: BarInterval::Daily,
        }
    }
}
