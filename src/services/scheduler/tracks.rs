//! The refresh tracks of a dashboard session.
//!
//! Each track owns the arguments it was started with (symbol, mode, symbol
//! list). Changing any of them restarts the track rather than mutating it.

use super::clock::Clock;
use super::jobs::{pause, Track};
use super::session::{FocusedSnapshot, SessionState};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::cache::Cache;
use crate::services::deep_analysis::{headline_set_hash, DeepAnalysisTrigger, ARTICLE_LIMIT};
use crate::services::news::{build_digest, digest_changed, filter_relevant};
use crate::services::signals::{self, SentimentScorer, SignalAnalysis};
use crate::services::watchlist::WatchlistCache;
use crate::sources::{MarketDataProvider, NewsProvider};
use crate::types::{
    Asset, HistoryRequest, MergeOutcome, NewsItem, PriceBar, SentimentLabel, TradingMode,
    WatchlistUpdate,
};
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const FOCUSED_FAST: &str = "focused-fast";
pub const FOCUSED_SLOW: &str = "focused-slow";
pub const GLOBAL_BATCH: &str = "global-batch";
pub const GLOBAL_DEEP: &str = "global-deep";
pub const GLOBAL_SLOW_DETAIL: &str = "global-slow-detail";
pub const DEEP_ANALYSIS: &str = "deep-analysis";

/// Last-known focused analyses keyed `SYMBOL:mode`.
pub type AnalysisCache = Cache<Arc<SignalAnalysis>>;

/// Everything the tracks share: providers, stores and the session channels.
pub struct TrackContext {
    pub market: Arc<dyn MarketDataProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub cache: Arc<WatchlistCache>,
    pub analyses: AnalysisCache,
    pub clock: Arc<dyn Clock>,
    pub config: Config,
    pub focused: watch::Sender<FocusedSnapshot>,
    pub state: watch::Receiver<SessionState>,
    pub scorer: SentimentScorer,
}

impl TrackContext {
    fn history_request(&self) -> HistoryRequest {
        HistoryRequest::trailing_days(self.clock.today(), self.config.history_lookback_days)
    }

    /// Sentiment of the focused digest, if it belongs to `symbol`.
    fn focused_sentiment(&self, symbol: &str) -> SentimentLabel {
        let snap = self.focused.borrow();
        match &snap.news {
            Some(digest) if snap.symbol == symbol => digest.sentiment.label,
            _ => SentimentLabel::Neutral,
        }
    }

    /// Record a focused-track failure without touching displayed data.
    fn publish_error(&self, symbol: &str, message: String) {
        self.focused.send_if_modified(|snap| {
            if snap.symbol != symbol {
                return false;
            }
            snap.error = Some(message);
            snap.loading = false;
            true
        });
    }

    /// Enough history to trust a background recommendation.
    fn ensure_history(&self, symbol: &str, bars: &[PriceBar]) -> Result<()> {
        if bars.len() < self.config.min_history_bars {
            return Err(AppError::InsufficientData(format!(
                "{} has {} bars, need {}",
                symbol,
                bars.len(),
                self.config.min_history_bars
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Focused tracks
// =============================================================================

/// Price and indicator refresh for the selected symbol.
pub struct FocusedFast {
    pub ctx: Arc<TrackContext>,
    pub symbol: String,
    pub mode: TradingMode,
}

#[async_trait]
impl Track for FocusedFast {
    fn name(&self) -> &'static str {
        FOCUSED_FAST
    }

    fn interval(&self) -> Duration {
        self.ctx.config.scheduler.focused_fast
    }

    async fn tick(&self, token: &CancellationToken) {
        let result = self
            .ctx
            .market
            .history(&self.symbol, self.ctx.history_request())
            .await;
        if token.is_cancelled() {
            return;
        }

        let bars = match result {
            Ok(bars) if bars.is_empty() => {
                self.ctx
                    .publish_error(&self.symbol, format!("No data found for {}", self.symbol));
                return;
            }
            Ok(bars) => bars,
            Err(e) => {
                warn!(track = FOCUSED_FAST, symbol = %self.symbol, "History refresh failed: {}", e);
                self.ctx.publish_error(&self.symbol, e.to_string());
                return;
            }
        };

        let sentiment = self.ctx.focused_sentiment(&self.symbol);
        let analysis = Arc::new(signals::analyze(&bars, self.mode, sentiment));
        self.ctx
            .analyses
            .insert(AnalysisCache::key(&self.symbol, self.mode), analysis.clone());

        if let Some(price) = analysis.latest_close() {
            self.ctx.cache.merge(
                &self.symbol,
                WatchlistUpdate::price(price).with_recommendation(analysis.recommendation.clone()),
            );
        }

        let now = self.ctx.clock.now();
        let current = {
            let state = self.ctx.state.borrow();
            state.symbol == self.symbol && state.mode == self.mode
        };
        self.ctx.focused.send_if_modified(|snap| {
            if !current || snap.symbol != self.symbol {
                return false;
            }
            snap.mode = self.mode;
            snap.analysis = Some(analysis);
            snap.loading = false;
            snap.error = None;
            snap.last_updated = Some(now);
            true
        });
    }
}

/// News and sentiment refresh for the selected symbol.
pub struct FocusedSlow {
    pub ctx: Arc<TrackContext>,
    pub symbol: String,
    /// Company name used for relevance matching.
    pub name: Option<String>,
}

#[async_trait]
impl Track for FocusedSlow {
    fn name(&self) -> &'static str {
        FOCUSED_SLOW
    }

    fn interval(&self) -> Duration {
        self.ctx.config.scheduler.focused_slow
    }

    async fn tick(&self, token: &CancellationToken) {
        let expired = self.ctx.analyses.cleanup();
        if expired > 0 {
            debug!(track = FOCUSED_SLOW, expired = expired, "Expired focused analyses evicted");
        }

        let result = self
            .ctx
            .news
            .news(&self.symbol, self.ctx.config.news_fetch_count)
            .await;
        if token.is_cancelled() {
            return;
        }

        let items = match result {
            Ok(items) => items,
            Err(e) => {
                warn!(track = FOCUSED_SLOW, symbol = %self.symbol, "News refresh failed: {}", e);
                return;
            }
        };

        let relevant = filter_relevant(
            items,
            &self.symbol,
            self.name.as_deref(),
            self.ctx.config.news_relevance_cap,
        );
        let digest = build_digest(&self.symbol, relevant, &self.ctx.scorer);
        let sentiment = digest.sentiment.clone();

        let applied = self.ctx.focused.send_if_modified(|snap| {
            if snap.symbol != self.symbol || !digest_changed(snap.news.as_deref(), &digest) {
                return false;
            }
            snap.news = Some(Arc::new(digest));
            true
        });

        if applied {
            debug!(
                track = FOCUSED_SLOW,
                symbol = %self.symbol,
                score = sentiment.score,
                "News digest updated"
            );
            self.ctx
                .cache
                .merge(&self.symbol, WatchlistUpdate::default().with_sentiment(sentiment));
        }
    }
}

// =============================================================================
// Global tracks
// =============================================================================

/// Price-only refresh of the whole watchlist, idle while the session is hidden.
pub struct GlobalBatch {
    pub ctx: Arc<TrackContext>,
    pub symbols: Vec<String>,
}

#[async_trait]
impl Track for GlobalBatch {
    fn name(&self) -> &'static str {
        GLOBAL_BATCH
    }

    fn interval(&self) -> Duration {
        self.ctx.config.scheduler.global_batch
    }

    async fn tick(&self, token: &CancellationToken) {
        if !self.ctx.state.borrow().visible {
            debug!(track = GLOBAL_BATCH, "Session hidden, skipping");
            return;
        }
        if self.symbols.is_empty() {
            return;
        }

        let result = self.ctx.market.quotes(&self.symbols).await;
        if token.is_cancelled() {
            return;
        }

        match result {
            Ok(quotes) => {
                let changed = quotes
                    .into_iter()
                    .filter(|q| q.price.is_finite())
                    .map(|q| self.ctx.cache.merge(&q.symbol, WatchlistUpdate::price(q.price)))
                    .filter(|outcome| *outcome != MergeOutcome::Unchanged)
                    .count();
                debug!(track = GLOBAL_BATCH, changed = changed, "Quotes merged");
            }
            Err(e) => warn!(track = GLOBAL_BATCH, "Batch quote refresh failed: {}", e),
        }
    }
}

/// Full recommendation recomputation for every watchlist symbol, in chunks.
pub struct GlobalDeep {
    pub ctx: Arc<TrackContext>,
    pub symbols: Vec<String>,
    pub mode: TradingMode,
}

impl GlobalDeep {
    fn apply(&self, symbol: &str, result: Result<Vec<PriceBar>>) {
        let bars = match result {
            Ok(bars) => bars,
            Err(e) if e.is_transient() => {
                warn!(track = GLOBAL_DEEP, symbol = %symbol, "History fetch failed: {}", e);
                return;
            }
            Err(e) => {
                debug!(track = GLOBAL_DEEP, symbol = %symbol, "No history: {}", e);
                return;
            }
        };
        if let Err(e) = self.ctx.ensure_history(symbol, &bars) {
            debug!(track = GLOBAL_DEEP, symbol = %symbol, "Skipping: {}", e);
            return;
        }

        let sentiment = self
            .ctx
            .cache
            .get(symbol)
            .map(|entry| entry.sentiment.label)
            .unwrap_or_default();
        let analysis = signals::analyze(&bars, self.mode, sentiment);
        if let Some(price) = analysis.latest_close() {
            self.ctx.cache.merge(
                symbol,
                WatchlistUpdate::price(price).with_recommendation(analysis.recommendation),
            );
        }
    }
}

#[async_trait]
impl Track for GlobalDeep {
    fn name(&self) -> &'static str {
        GLOBAL_DEEP
    }

    fn interval(&self) -> Duration {
        self.ctx.config.scheduler.global_deep
    }

    async fn tick(&self, token: &CancellationToken) {
        let settings = &self.ctx.config.scheduler;
        let request = self.ctx.history_request();

        for (i, chunk) in self.symbols.chunks(settings.deep_chunk_size.max(1)).enumerate() {
            if i > 0 && !pause(token, self.ctx.clock.as_ref(), settings.deep_chunk_cooldown).await {
                return;
            }

            let fetches = chunk.iter().map(|symbol| self.ctx.market.history(symbol, request));
            let results = join_all(fetches).await;
            if token.is_cancelled() {
                return;
            }

            for (symbol, result) in chunk.iter().zip(results) {
                self.apply(symbol, result);
            }
        }

        info!(
            track = GLOBAL_DEEP,
            mode = %self.mode,
            symbols = self.symbols.len(),
            "Watchlist recommendations refreshed"
        );
    }
}

/// Price and sentiment refresh for a capped set of background symbols.
pub struct GlobalSlowDetail {
    pub ctx: Arc<TrackContext>,
    pub targets: Vec<Asset>,
    pub mode: TradingMode,
}

impl GlobalSlowDetail {
    fn apply(&self, asset: &Asset, history: Result<Vec<PriceBar>>, news: Result<Vec<NewsItem>>) {
        let (bars, items) = match (history, news) {
            (Ok(bars), Ok(items)) => (bars, items),
            (Err(e), _) | (_, Err(e)) => {
                warn!(track = GLOBAL_SLOW_DETAIL, symbol = %asset.symbol, "Detail fetch failed: {}", e);
                return;
            }
        };
        if let Err(e) = self.ctx.ensure_history(&asset.symbol, &bars) {
            debug!(track = GLOBAL_SLOW_DETAIL, symbol = %asset.symbol, "Skipping: {}", e);
            return;
        }

        let relevant = filter_relevant(
            items,
            &asset.symbol,
            Some(&asset.name),
            self.ctx.config.news_relevance_cap,
        );
        let digest = build_digest(&asset.symbol, relevant, &self.ctx.scorer);
        let analysis = signals::analyze(&bars, self.mode, digest.sentiment.label);

        if let Some(price) = analysis.latest_close() {
            self.ctx.cache.merge(
                &asset.symbol,
                WatchlistUpdate::price(price)
                    .with_recommendation(analysis.recommendation)
                    .with_sentiment(digest.sentiment),
            );
        }
    }
}

#[async_trait]
impl Track for GlobalSlowDetail {
    fn name(&self) -> &'static str {
        GLOBAL_SLOW_DETAIL
    }

    fn interval(&self) -> Duration {
        self.ctx.config.scheduler.slow_detail
    }

    async fn tick(&self, token: &CancellationToken) {
        let settings = &self.ctx.config.scheduler;
        let request = self.ctx.history_request();
        let count = self.ctx.config.news_fetch_count;

        for (i, chunk) in self
            .targets
            .chunks(settings.slow_detail_chunk_size.max(1))
            .enumerate()
        {
            if i > 0
                && !pause(token, self.ctx.clock.as_ref(), settings.slow_detail_chunk_delay).await
            {
                return;
            }

            let fetches = chunk.iter().map(|asset| async move {
                tokio::join!(
                    self.ctx.market.history(&asset.symbol, request),
                    self.ctx.news.news(&asset.symbol, count)
                )
            });
            let results = join_all(fetches).await;
            if token.is_cancelled() {
                return;
            }

            for (asset, (history, news)) in chunk.iter().zip(results) {
                self.apply(asset, history, news);
            }
        }

        debug!(
            track = GLOBAL_SLOW_DETAIL,
            symbols = self.targets.len(),
            "Background details refreshed"
        );
    }
}

// =============================================================================
// Deep analysis trigger
// =============================================================================

/// Headline-set hash and top articles of the focused digest, if it belongs to `symbol`.
fn focused_headlines(snap: &FocusedSnapshot, symbol: &str) -> Option<(String, Vec<NewsItem>)> {
    if snap.symbol != symbol {
        return None;
    }
    let digest = snap.news.as_ref()?;
    let hash = headline_set_hash(&digest.items)?;
    let items = digest.items.iter().take(ARTICLE_LIMIT).cloned().collect();
    Some((hash, items))
}

/// Watch the focused digest and request a deep analysis once its headline set
/// has been stable for the debounce period.
///
/// A headline set is attempted once per job, successful or not; a failed
/// request is retried when the set changes or the symbol is reselected.
pub async fn run_deep_analysis(
    ctx: Arc<TrackContext>,
    trigger: Arc<DeepAnalysisTrigger>,
    symbol: String,
    token: CancellationToken,
) {
    let debounce = ctx.config.scheduler.insight_debounce;
    let mut focused = ctx.focused.subscribe();
    let mut handled: Option<String> = None;
    let mut pending: Option<(String, Vec<NewsItem>)> = None;
    let mut timer = ctx.clock.sleep(debounce);

    loop {
        let current = focused_headlines(&focused.borrow_and_update(), &symbol);
        if let Some((hash, items)) = current {
            if handled.as_ref() == Some(&hash) {
                // Back to the set already analysed; whatever was pending is stale
                pending = None;
            } else if pending.as_ref().map_or(true, |(pending_hash, _)| *pending_hash != hash) {
                pending = Some((hash, items));
                timer = ctx.clock.sleep(debounce);
            }
        }

        if pending.is_none() {
            tokio::select! {
                _ = token.cancelled() => return,
                changed = focused.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    continue;
                }
            }
        }

        tokio::select! {
            _ = token.cancelled() => return,
            changed = focused.changed() => {
                if changed.is_err() {
                    return;
                }
                continue;
            }
            _ = &mut timer => {}
        }

        let Some((hash, items)) = pending.take() else {
            continue;
        };
        handled = Some(hash);

        let result = tokio::select! {
            _ = token.cancelled() => return,
            result = trigger.analyze(&symbol, &items) => result,
        };
        if token.is_cancelled() {
            return;
        }

        let Ok(Some(insight)) = result else {
            continue;
        };

        ctx.focused.send_if_modified(|snap| {
            if snap.symbol != symbol {
                return false;
            }
            snap.ai_insight = Some(insight.clone());
            true
        });
        ctx.cache.merge(
            &symbol,
            WatchlistUpdate::default().with_ai_insight((*insight).clone()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::scheduler::clock::TokioClock;
    use crate::sources::{DeepAnalysisProvider, HeadlineOnlyScraper, NewsProvider};
    use crate::types::{AiInsight, CategoryFilter, NewsDigest, Quote, SentimentResult};
    use std::sync::Mutex;

    fn digest(symbol: &str, ids: &[&str]) -> NewsDigest {
        NewsDigest {
            symbol: symbol.to_string(),
            items: ids
                .iter()
                .map(|id| NewsItem {
                    uuid: id.to_string(),
                    title: format!("{} headline {}", symbol, id),
                    publisher: "Wire".to_string(),
                    link: String::new(),
                    published_at: None,
                })
                .collect(),
            sentiment: SentimentResult::neutral(),
        }
    }

    #[test]
    fn test_focused_headlines_takes_top_three() {
        let mut snap = FocusedSnapshot::new("AAPL", TradingMode::Swing);
        assert!(focused_headlines(&snap, "AAPL").is_none());

        snap.news = Some(Arc::new(digest("AAPL", &["a", "b", "c", "d"])));
        let (hash, items) = focused_headlines(&snap, "AAPL").unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(Some(hash), headline_set_hash(&items));

        assert!(focused_headlines(&snap, "MSFT").is_none());
    }

    struct NoMarket;

    #[async_trait]
    impl MarketDataProvider for NoMarket {
        async fn history(&self, symbol: &str, _request: HistoryRequest) -> Result<Vec<PriceBar>> {
            Err(AppError::NotFound(symbol.to_string()))
        }

        async fn quotes(&self, _symbols: &[String]) -> Result<Vec<Quote>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl NewsProvider for NoMarket {
        async fn news(&self, _symbol: &str, _count: usize) -> Result<Vec<NewsItem>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct RecordingAnalyst {
        texts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DeepAnalysisProvider for RecordingAnalyst {
        async fn analyze(&self, _symbol: &str, text: &str) -> Result<AiInsight> {
            self.texts.lock().unwrap().push(text.to_string());
            Ok(AiInsight {
                score: 6.0,
                summary: text.to_string(),
                reasoning: String::new(),
            })
        }
    }

    fn context(symbol: &str) -> Arc<TrackContext> {
        let (focused, _) = watch::channel(FocusedSnapshot::new(symbol, TradingMode::Swing));
        let (_state_tx, state) = watch::channel(SessionState {
            symbol: symbol.to_string(),
            mode: TradingMode::Swing,
            watchlist: Arc::new(Vec::new()),
            category: CategoryFilter::All,
            visible: true,
        });
        Arc::new(TrackContext {
            market: Arc::new(NoMarket),
            news: Arc::new(NoMarket),
            cache: WatchlistCache::new(),
            analyses: AnalysisCache::with_ttl(Duration::from_secs(300), Arc::new(TokioClock)),
            clock: Arc::new(TokioClock),
            config: Config::default(),
            focused,
            state,
            scorer: SentimentScorer::new(),
        })
    }

    fn publish(ctx: &TrackContext, ids: &[&str]) {
        ctx.focused
            .send_modify(|snap| snap.news = Some(Arc::new(digest("AAPL", ids))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deep_analysis_drops_pending_set_when_headlines_revert() {
        let ctx = context("AAPL");
        let analyst = Arc::new(RecordingAnalyst::default());
        let trigger = Arc::new(DeepAnalysisTrigger::new(
            analyst.clone(),
            Arc::new(HeadlineOnlyScraper),
            Duration::from_secs(5),
        ));
        let debounce = ctx.config.scheduler.insight_debounce;
        let token = CancellationToken::new();
        let job = tokio::spawn(run_deep_analysis(
            ctx.clone(),
            trigger,
            "AAPL".to_string(),
            token.clone(),
        ));

        publish(&ctx, &["a1", "a2"]);
        tokio::time::sleep(debounce * 2).await;
        assert_eq!(analyst.texts.lock().unwrap().len(), 1);

        // A different set shows up and is withdrawn before the debounce elapses
        publish(&ctx, &["b1", "b2"]);
        tokio::time::sleep(debounce / 3).await;
        publish(&ctx, &["a1", "a2"]);
        tokio::time::sleep(debounce * 3).await;

        let texts = analyst.texts.lock().unwrap().clone();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("AAPL headline a1"));
        let insight = ctx.focused.borrow().ai_insight.clone().unwrap();
        assert!(!insight.summary.contains("headline b1"));

        token.cancel();
        job.await.unwrap();
    }

    #[test]
    fn test_ensure_history_reports_insufficient_data() {
        let ctx = context("AAPL");
        let min = ctx.config.min_history_bars;
        let bars: Vec<PriceBar> = Vec::new();
        let err = ctx.ensure_history("AAPL", &bars).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
        assert!(!err.is_transient());
        assert!(err.to_string().contains(&format!("need {}", min)));
    }

    #[test]
    fn test_focused_headlines_empty_digest() {
        let mut snap = FocusedSnapshot::new("AAPL", TradingMode::Swing);
        snap.news = Some(Arc::new(digest("AAPL", &[])));
        assert!(focused_headlines(&snap, "AAPL").is_none());
    }
}
