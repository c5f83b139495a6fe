use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading style selecting the trend reference and exit distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TradingMode {
    /// Days to weeks. Trend measured against SMA 200.
    #[default]
    Swing,
    /// Intraday. Trend measured against EMA 50.
    Scalp,
}

impl TradingMode {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "swing" | "swing_trading" => Some(Self::Swing),
            "scalp" | "scalping" | "day" | "day_trade" => Some(Self::Scalp),
            _ => None,
        }
    }

    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Swing => "Swing",
            Self::Scalp => "Day Trade",
        }
    }

    /// Query token used by the cache keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swing => "swing",
            Self::Scalp => "scalp",
        }
    }

    /// ATR multipliers for (stop loss, take profit).
    pub fn exit_multipliers(&self) -> (f64, f64) {
        match self {
            // Tighter exits for short holding periods
            Self::Scalp => (1.0, 2.0),
            Self::Swing => (2.0, 4.0),
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommended action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Long,
    Short,
    Wait,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Long => "LONG",
            Action::Short => "SHORT",
            Action::Wait => "WAIT",
        }
    }
}

/// Confidence attached to a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Whether a candlestick pattern points up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternDirection {
    Bullish,
    Bearish,
}

/// Candlestick patterns recognised on the trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternName {
    BullishEngulfing,
    Hammer,
    MorningStar,
    BearishEngulfing,
    ShootingStar,
    EveningStar,
}

impl PatternName {
    /// Get display label for this pattern.
    pub fn label(&self) -> &'static str {
        match self {
            PatternName::BullishEngulfing => "Bullish Engulfing",
            PatternName::Hammer => "Hammer",
            PatternName::MorningStar => "Morning Star",
            PatternName::BearishEngulfing => "Bearish Engulfing",
            PatternName::ShootingStar => "Shooting Star",
            PatternName::EveningStar => "Evening Star",
        }
    }

    pub fn direction(&self) -> PatternDirection {
        match self {
            PatternName::BullishEngulfing | PatternName::Hammer | PatternName::MorningStar => {
                PatternDirection::Bullish
            }
            PatternName::BearishEngulfing
            | PatternName::ShootingStar
            | PatternName::EveningStar => PatternDirection::Bearish,
        }
    }
}

impl fmt::Display for PatternName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rule-based trade recommendation for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecommendation {
    pub action: Action,
    pub confidence: Confidence,
    pub reason: String,
    /// Patterns detected on the latest bar, reported even on WAIT.
    #[serde(default)]
    pub patterns: Vec<PatternName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
}

impl TradeRecommendation {
    /// A WAIT/LOW recommendation carrying the given reason.
    pub fn wait(reason: impl Into<String>) -> Self {
        Self {
            action: Action::Wait,
            confidence: Confidence::Low,
            reason: reason.into(),
            patterns: Vec::new(),
            stop_loss: None,
            take_profit: None,
        }
    }

    /// Placeholder shown for a symbol that has never been analysed.
    pub fn loading() -> Self {
        Self::wait("Loading...")
    }

    /// Directional score: +2/+1 for HIGH/other LONG, -2/-1 for SHORT, 0 for WAIT.
    pub fn directional_score(&self) -> f64 {
        let magnitude = if self.confidence == Confidence::High { 2.0 } else { 1.0 };
        match self.action {
            Action::Long => magnitude,
            Action::Short => -magnitude,
            Action::Wait => 0.0,
        }
    }
}
