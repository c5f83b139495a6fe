//! Rule-based trade recommendation.
//!
//! A signal needs a trend (close against the mode's trend reference), at least
//! one trigger in the same direction (RSI extreme, MACD histogram cross, or a
//! candlestick pattern), and news sentiment that does not point the other way.

use crate::types::{
    Action, Confidence, IndicatorFrame, PatternDirection, PatternName, SentimentLabel,
    TradeRecommendation, TradingMode,
};

/// Frames required before any signal is attempted.
pub const MIN_SIGNAL_FRAMES: usize = 200;

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;

/// Turns an enriched series into a recommendation.
#[derive(Default)]
pub struct SignalEngine;

impl SignalEngine {
    pub fn new() -> Self {
        Self
    }

    /// Trend reference for the latest frame under `mode`.
    fn trend_reference(latest: &IndicatorFrame, mode: TradingMode) -> Option<f64> {
        match mode {
            TradingMode::Swing => latest.sma200,
            TradingMode::Scalp => latest.ema50.or(latest.sma50),
        }
    }

    /// Evaluate `frames` with the patterns detected on the latest frame.
    pub fn evaluate(
        &self,
        frames: &[IndicatorFrame],
        patterns: &[PatternName],
        mode: TradingMode,
        sentiment: SentimentLabel,
    ) -> TradeRecommendation {
        if frames.len() < MIN_SIGNAL_FRAMES {
            return TradeRecommendation::wait("Not enough data");
        }
        let (Some(latest), Some(prev)) = (frames.last(), frames.get(frames.len() - 2)) else {
            return TradeRecommendation::wait("Not enough data");
        };

        let close = latest.close();
        let trend = Self::trend_reference(latest, mode);
        let uptrend = trend.is_some_and(|t| close > t);
        let downtrend = trend.is_some_and(|t| close < t);

        let rsi = latest.rsi14.unwrap_or(50.0);
        let oversold = rsi < RSI_OVERSOLD;
        let overbought = rsi > RSI_OVERBOUGHT;

        let hist = latest.macd_histogram().unwrap_or(0.0);
        let prev_hist = prev.macd_histogram().unwrap_or(0.0);
        let macd_bullish_cross = hist > 0.0 && prev_hist <= 0.0;
        let macd_bearish_cross = hist < 0.0 && prev_hist >= 0.0;

        let bullish: Vec<PatternName> = patterns
            .iter()
            .copied()
            .filter(|p| p.direction() == PatternDirection::Bullish)
            .collect();
        let bearish: Vec<PatternName> = patterns
            .iter()
            .copied()
            .filter(|p| p.direction() == PatternDirection::Bearish)
            .collect();

        if uptrend
            && (oversold || macd_bullish_cross || !bullish.is_empty())
            && sentiment != SentimentLabel::Bearish
        {
            let mut factors = vec!["Uptrend".to_string()];
            if oversold {
                factors.push("RSI Oversold".to_string());
            }
            if macd_bullish_cross {
                factors.push("MACD Bullish Cross".to_string());
            }
            factors.extend(bullish.iter().map(|p| p.label().to_string()));

            return Self::directional(Action::Long, factors, !bullish.is_empty(), latest, mode, patterns);
        }

        if downtrend
            && (overbought || macd_bearish_cross || !bearish.is_empty())
            && sentiment != SentimentLabel::Bullish
        {
            let mut factors = vec!["Downtrend".to_string()];
            if overbought {
                factors.push("RSI Overbought".to_string());
            }
            if macd_bearish_cross {
                factors.push("MACD Bearish Cross".to_string());
            }
            factors.extend(bearish.iter().map(|p| p.label().to_string()));

            return Self::directional(Action::Short, factors, !bearish.is_empty(), latest, mode, patterns);
        }

        TradeRecommendation {
            patterns: patterns.to_vec(),
            ..TradeRecommendation::wait("No clear signal")
        }
    }

    fn directional(
        action: Action,
        factors: Vec<String>,
        pattern_confirmed: bool,
        latest: &IndicatorFrame,
        mode: TradingMode,
        patterns: &[PatternName],
    ) -> TradeRecommendation {
        let (stop_loss, take_profit) = exits(action, latest.close(), latest.effective_atr(), mode);
        TradeRecommendation {
            action,
            confidence: if pattern_confirmed {
                Confidence::High
            } else {
                Confidence::Medium
            },
            reason: factors.join(", "),
            patterns: patterns.to_vec(),
            stop_loss: Some(stop_loss),
            take_profit: Some(take_profit),
        }
    }
}

/// Stop-loss and take-profit around `price`, sized in ATR multiples.
pub fn exits(action: Action, price: f64, atr: f64, mode: TradingMode) -> (f64, f64) {
    let (stop_mult, target_mult) = mode.exit_multipliers();
    match action {
        Action::Short => (price + atr * stop_mult, price - atr * target_mult),
        _ => (price - atr * stop_mult, price + atr * target_mult),
    }
}
