//! Dashboard session tests against in-memory providers.
//!
//! All tests run on paused tokio time, so the track intervals advance
//! deterministically as the test sleeps.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swingbot::config::{Config, SchedulerConfig};
use swingbot::services::scheduler::Clock;
use swingbot::services::SortOption;
use swingbot::sources::{DeepAnalysisProvider, MarketDataProvider, NewsProvider};
use swingbot::types::{
    AiInsight, Asset, AssetCategory, HistoryRequest, NewsItem, PriceBar, Quote, TradingMode,
};
use swingbot::{AppError, DashboardSession, Result, SessionProviders};
use tokio::time::sleep;

// =============================================================================
// Fakes
// =============================================================================

fn rising_bars(base: f64, n: usize) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let close = base + i as f64 * 0.5;
            PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close - 0.25,
                high: close + 0.5,
                low: close - 0.75,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

#[derive(Default)]
struct FakeMarket {
    bars: HashMap<String, Vec<PriceBar>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    quotes_enabled: bool,
    history_calls: Mutex<HashMap<String, usize>>,
    quote_calls: AtomicUsize,
}

impl FakeMarket {
    fn with_symbol(mut self, symbol: &str, base: f64, n: usize) -> Self {
        self.bars.insert(symbol.to_string(), rising_bars(base, n));
        self
    }

    fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    fn delayed(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_string(), delay);
        self
    }

    fn with_quotes(mut self) -> Self {
        self.quotes_enabled = true;
        self
    }

    fn last_close(&self, symbol: &str) -> f64 {
        self.bars[symbol].last().unwrap().close
    }

    fn history_count(&self, symbol: &str) -> usize {
        self.history_calls
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarket {
    async fn history(&self, symbol: &str, _request: HistoryRequest) -> Result<Vec<PriceBar>> {
        *self
            .history_calls
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default() += 1;
        if let Some(delay) = self.delays.get(symbol) {
            sleep(*delay).await;
        }
        if self.failing.contains(symbol) {
            return Err(AppError::ExternalApi("upstream down".to_string()));
        }
        self.bars
            .get(symbol)
            .cloned()
            .ok_or_else(|| AppError::NotFound(symbol.to_string()))
    }

    async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        if !self.quotes_enabled {
            return Ok(Vec::new());
        }
        Ok(symbols
            .iter()
            .filter_map(|symbol| {
                let bar = self.bars.get(symbol)?.last()?;
                Some(Quote {
                    symbol: symbol.clone(),
                    price: bar.close + 1.0,
                    change_pct: None,
                    display_name: None,
                })
            })
            .collect())
    }
}

#[derive(Default)]
struct FakeNews {
    items: HashMap<String, Vec<NewsItem>>,
    calls: AtomicUsize,
}

impl FakeNews {
    fn with_headlines(mut self, symbol: &str, titles: &[&str]) -> Self {
        let items = titles
            .iter()
            .enumerate()
            .map(|(i, title)| NewsItem {
                uuid: format!("{}-{}", symbol, i),
                title: title.to_string(),
                publisher: "Wire".to_string(),
                link: String::new(),
                published_at: None,
            })
            .collect();
        self.items.insert(symbol.to_string(), items);
        self
    }
}

#[async_trait]
impl NewsProvider for FakeNews {
    async fn news(&self, symbol: &str, count: usize) -> Result<Vec<NewsItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut items = self.items.get(symbol).cloned().unwrap_or_default();
        items.truncate(count);
        Ok(items)
    }
}

#[derive(Default)]
struct FakeDeepAnalysis {
    calls: AtomicUsize,
}

#[async_trait]
impl DeepAnalysisProvider for FakeDeepAnalysis {
    async fn analyze(&self, _symbol: &str, text: &str) -> Result<AiInsight> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AiInsight {
            score: 8.0,
            summary: format!("{} chars analysed", text.len()),
            reasoning: "- Strong demand".to_string(),
        })
    }
}

/// Fixed calendar with tokio-driven sleeps.
struct FixedClock;

#[async_trait]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 15, 30, 0).unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        sleep(duration).await;
    }
}

fn watchlist(symbols: &[&str]) -> Vec<Asset> {
    symbols
        .iter()
        .map(|s| Asset::new(s, &format!("{} Corp", s), AssetCategory::Stock))
        .collect()
}

fn config(symbol: &str, scheduler: SchedulerConfig) -> Config {
    Config {
        default_symbol: symbol.to_string(),
        scheduler,
        ..Config::default()
    }
}

fn start(
    config: Config,
    market: &Arc<FakeMarket>,
    news: &Arc<FakeNews>,
    assets: Vec<Asset>,
) -> DashboardSession {
    let providers = SessionProviders::new(market.clone(), news.clone()).with_clock(Arc::new(FixedClock));
    DashboardSession::start(config, providers, assets)
}

// =============================================================================
// Focused tracks
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_focused_fast_publishes_analysis() {
    let market = Arc::new(FakeMarket::default().with_symbol("AAPL", 100.0, 250));
    let news = Arc::new(FakeNews::default());
    let session = start(
        config("aapl", SchedulerConfig::default()),
        &market,
        &news,
        watchlist(&["AAPL"]),
    );

    let focused = session.focused();
    assert!(focused.borrow().loading);

    sleep(Duration::from_millis(10)).await;
    let snap = focused.borrow().clone();
    assert_eq!(snap.symbol, "AAPL");
    assert!(!snap.loading);
    assert!(snap.error.is_none());
    assert_eq!(snap.latest().unwrap().close(), market.last_close("AAPL"));
    assert_eq!(snap.last_updated, Some(FixedClock.now()));

    let entry = session.cache().get("AAPL").unwrap();
    assert_eq!(entry.price, Some(market.last_close("AAPL")));
    assert_ne!(entry.recommendation.reason, "Loading...");

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_keeps_displayed_data() {
    let market = Arc::new(FakeMarket::default().with_symbol("AAPL", 100.0, 250));
    let news = Arc::new(FakeNews::default());
    let session = start(
        config("AAPL", SchedulerConfig::default()),
        &market,
        &news,
        watchlist(&["AAPL"]),
    );
    sleep(Duration::from_millis(10)).await;

    // Unknown symbol: the provider errors on every tick
    session.select_symbol("NOPE");
    sleep(Duration::from_millis(10)).await;
    let snap = session.focused().borrow().clone();
    assert_eq!(snap.symbol, "NOPE");
    assert!(snap.error.is_some());
    assert!(snap.analysis.is_none());
    assert!(!snap.loading);

    // Back to AAPL: the last-known analysis is served before the next fetch lands
    session.select_symbol("AAPL");
    let snap = session.focused().borrow().clone();
    assert!(snap.analysis.is_some());
    assert!(!snap.loading);
    assert!(snap.error.is_none());

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_switching_symbol_discards_stale_response() {
    let market = Arc::new(
        FakeMarket::default()
            .with_symbol("AAPL", 100.0, 250)
            .with_symbol("MSFT", 300.0, 250)
            .delayed("AAPL", Duration::from_secs(3)),
    );
    let news = Arc::new(FakeNews::default());
    let session = start(
        config("AAPL", SchedulerConfig::default()),
        &market,
        &news,
        watchlist(&["AAPL", "MSFT"]),
    );

    sleep(Duration::from_secs(1)).await;
    session.select_symbol("msft");
    sleep(Duration::from_secs(4)).await;

    let snap = session.focused().borrow().clone();
    assert_eq!(snap.symbol, "MSFT");
    assert_eq!(snap.latest().unwrap().close(), market.last_close("MSFT"));
    assert_eq!(session.state().symbol, "MSFT");

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_news_keeps_digest_identity() {
    let market = Arc::new(FakeMarket::default().with_symbol("TSLA", 200.0, 250));
    let news = Arc::new(FakeNews::default().with_headlines(
        "TSLA",
        &["TSLA deliveries surge", "TSLA opens new plant", "Weather today"],
    ));
    let session = start(
        config("TSLA", SchedulerConfig::default()),
        &market,
        &news,
        watchlist(&["TSLA"]),
    );

    sleep(Duration::from_millis(10)).await;
    let first = session.focused().borrow().news.clone().unwrap();
    // "Weather today" does not mention the ticker
    assert_eq!(first.items.len(), 2);
    assert_eq!(session.cache().get("TSLA").unwrap().sentiment.score, 3.0);

    sleep(Duration::from_secs(61)).await;
    assert!(news.calls.load(Ordering::SeqCst) >= 3);
    let later = session.focused().borrow().news.clone().unwrap();
    assert!(Arc::ptr_eq(&first, &later));

    session.shutdown().await;
}

// =============================================================================
// Global tracks
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_global_batch_pauses_while_hidden() {
    let market = Arc::new(
        FakeMarket::default()
            .with_symbol("AAPL", 100.0, 250)
            .with_symbol("MSFT", 300.0, 250)
            .with_quotes(),
    );
    let news = Arc::new(FakeNews::default());
    let scheduler = SchedulerConfig {
        slow_detail_cap: 0,
        ..SchedulerConfig::default()
    };
    let session = start(config("AAPL", scheduler), &market, &news, watchlist(&["AAPL", "MSFT"]));

    sleep(Duration::from_millis(2_500)).await;
    assert_eq!(market.quote_calls.load(Ordering::SeqCst), 3);

    session.set_visible(false);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(market.quote_calls.load(Ordering::SeqCst), 3);

    session.set_visible(true);
    sleep(Duration::from_secs(2)).await;
    assert!(market.quote_calls.load(Ordering::SeqCst) > 3);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_global_deep_chunks_and_isolates_failures() {
    let mut market = FakeMarket::default()
        .with_symbol("SHORT", 10.0, 20)
        .failing("FAIL");
    for (i, symbol) in ["A1", "A2", "A3", "A4", "A5", "A6"].iter().enumerate() {
        market = market.with_symbol(symbol, 50.0 + i as f64 * 10.0, 250);
    }
    let market = Arc::new(market);
    let news = Arc::new(FakeNews::default());
    let scheduler = SchedulerConfig {
        deep_chunk_size: 3,
        slow_detail_cap: 0,
        ..SchedulerConfig::default()
    };
    let session = start(
        config("A1", scheduler),
        &market,
        &news,
        watchlist(&["A1", "A2", "A3", "A4", "A5", "A6", "SHORT", "FAIL"]),
    );

    // Second chunk waits for the cooldown
    sleep(Duration::from_millis(500)).await;
    assert_eq!(market.history_count("A2"), 1);
    assert_eq!(market.history_count("A4"), 0);

    sleep(Duration::from_secs(3)).await;
    assert_eq!(market.history_count("A4"), 1);
    assert_eq!(market.history_count("SHORT"), 1);
    assert_eq!(market.history_count("FAIL"), 1);

    let cache = session.cache();
    for symbol in ["A2", "A3", "A4", "A5", "A6"] {
        let entry = cache.get(symbol).unwrap();
        assert_eq!(entry.price, Some(market.last_close(symbol)));
        assert_ne!(entry.recommendation.reason, "Loading...");
    }
    assert!(cache.get("SHORT").is_none());
    assert!(cache.get("FAIL").is_none());

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_mode_change_reruns_global_deep() {
    let market = Arc::new(
        FakeMarket::default()
            .with_symbol("AAPL", 100.0, 250)
            .with_symbol("MSFT", 300.0, 250),
    );
    let news = Arc::new(FakeNews::default());
    let scheduler = SchedulerConfig {
        slow_detail_cap: 0,
        ..SchedulerConfig::default()
    };
    let session = start(config("AAPL", scheduler), &market, &news, watchlist(&["AAPL", "MSFT"]));

    sleep(Duration::from_secs(5)).await;
    assert_eq!(market.history_count("MSFT"), 1);

    session.set_mode(TradingMode::Scalp);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(market.history_count("MSFT"), 2);
    assert_eq!(session.focused().borrow().mode, TradingMode::Scalp);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_mode_label_follows_published_analysis() {
    let market = Arc::new(FakeMarket::default().with_symbol("AAPL", 100.0, 250));
    let news = Arc::new(FakeNews::default());
    let session = start(
        config("AAPL", SchedulerConfig::default()),
        &market,
        &news,
        watchlist(&["AAPL"]),
    );
    sleep(Duration::from_millis(10)).await;
    let swing = session.focused().borrow().analysis.clone().unwrap();

    // No scalp analysis yet: the swing one stays on screen under its own label
    session.set_mode(TradingMode::Scalp);
    let snap = session.focused().borrow().clone();
    assert_eq!(snap.mode, TradingMode::Swing);
    assert!(Arc::ptr_eq(snap.analysis.as_ref().unwrap(), &swing));
    assert!(!snap.loading);

    sleep(Duration::from_millis(10)).await;
    let snap = session.focused().borrow().clone();
    assert_eq!(snap.mode, TradingMode::Scalp);
    assert!(!Arc::ptr_eq(snap.analysis.as_ref().unwrap(), &swing));

    // Swing is cached, so switching back relabels at once
    session.set_mode(TradingMode::Swing);
    let snap = session.focused().borrow().clone();
    assert_eq!(snap.mode, TradingMode::Swing);
    assert!(Arc::ptr_eq(snap.analysis.as_ref().unwrap(), &swing));

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_set_watchlist_evicts_dropped_symbols() {
    let market = Arc::new(
        FakeMarket::default()
            .with_symbol("AAPL", 100.0, 250)
            .with_symbol("MSFT", 300.0, 250),
    );
    let news = Arc::new(FakeNews::default());
    let scheduler = SchedulerConfig {
        slow_detail_cap: 0,
        ..SchedulerConfig::default()
    };
    let session = start(config("AAPL", scheduler), &market, &news, watchlist(&["AAPL", "MSFT"]));
    sleep(Duration::from_millis(10)).await;
    assert!(session.cache().get("MSFT").is_some());

    session.set_watchlist(watchlist(&["aapl"]));
    let cache = session.cache();
    assert!(cache.get("MSFT").is_none());
    assert!(cache.get("AAPL").is_some());
    assert_eq!(cache.len(), 1);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_slow_detail_skips_selected_symbol() {
    let market = Arc::new(
        FakeMarket::default()
            .with_symbol("AAPL", 100.0, 250)
            .with_symbol("MSFT", 300.0, 250),
    );
    let news = Arc::new(FakeNews::default().with_headlines("MSFT", &["MSFT record profit"]));
    let scheduler = SchedulerConfig {
        global_deep: Duration::from_secs(3_600),
        ..SchedulerConfig::default()
    };
    let session = start(config("AAPL", scheduler), &market, &news, watchlist(&["AAPL", "MSFT"]));

    sleep(Duration::from_millis(10)).await;
    // Global deep once plus slow detail once
    assert_eq!(market.history_count("MSFT"), 2);
    let entry = session.cache().get("MSFT").unwrap();
    assert_eq!(entry.sentiment.score, 5.0);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(market.history_count("MSFT"), 3);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_lowercase_watchlist_symbols_are_normalized() {
    let market = Arc::new(
        FakeMarket::default()
            .with_symbol("AAPL", 100.0, 250)
            .with_symbol("MSFT", 300.0, 250),
    );
    let news = Arc::new(
        FakeNews::default().with_headlines("AAPL", &["Apple Inc surges", "AAPL beats", "Weather"]),
    );
    let lowercase = |symbol: &str, name: &str| Asset {
        symbol: symbol.to_string(),
        name: name.to_string(),
        category: AssetCategory::Stock,
    };
    let session = start(
        config("AAPL", SchedulerConfig::default()),
        &market,
        &news,
        vec![lowercase("aapl", "Apple Inc"), lowercase("msft", "Microsoft")],
    );

    sleep(Duration::from_millis(10)).await;
    let symbols: Vec<String> = session.state().watchlist.iter().map(|a| a.symbol.clone()).collect();
    assert_eq!(symbols, vec!["AAPL", "MSFT"]);

    // Focused fast plus global deep; slow detail leaves the selected symbol alone
    assert_eq!(market.history_count("AAPL"), 2);
    assert_eq!(market.history_count("aapl"), 0);
    assert_eq!(market.history_count("MSFT"), 2);

    // The company name reaches the relevance filter
    let digest = session.focused().borrow().news.clone().unwrap();
    assert_eq!(digest.items.len(), 2);

    session.set_watchlist(vec![lowercase("msft", "Microsoft"), lowercase("aapl", "Apple Inc")]);
    let ranked: Vec<String> = session
        .ranked(SortOption::Symbol, "")
        .into_iter()
        .map(|a| a.symbol)
        .collect();
    assert_eq!(ranked, vec!["AAPL", "MSFT"]);

    session.shutdown().await;
}

// =============================================================================
// Deep analysis
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_deep_analysis_is_debounced_and_cached() {
    let market = Arc::new(
        FakeMarket::default()
            .with_symbol("AAPL", 100.0, 250)
            .with_symbol("MSFT", 300.0, 250),
    );
    let news = Arc::new(FakeNews::default().with_headlines(
        "AAPL",
        &["AAPL beats estimates", "Apple unveils chip", "AAPL shares jump", "AAPL buyback"],
    ));
    let deep = Arc::new(FakeDeepAnalysis::default());
    let providers = SessionProviders::new(market.clone(), news.clone())
        .with_deep_analysis(deep.clone())
        .with_clock(Arc::new(FixedClock));
    let session = DashboardSession::start(
        config("AAPL", SchedulerConfig::default()),
        providers,
        watchlist(&["AAPL", "MSFT"]),
    );

    sleep(Duration::from_secs(1)).await;
    assert_eq!(deep.calls.load(Ordering::SeqCst), 0);
    assert!(session.focused().borrow().ai_insight.is_none());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(deep.calls.load(Ordering::SeqCst), 1);
    let insight = session.focused().borrow().ai_insight.clone().unwrap();
    assert_eq!(insight.score, 8.0);
    assert_eq!(session.cache().get("AAPL").unwrap().ai_insight.unwrap().score, 8.0);

    // Same headline set on later news ticks
    sleep(Duration::from_secs(65)).await;
    assert_eq!(deep.calls.load(Ordering::SeqCst), 1);

    // Reselecting serves the cached insight
    session.select_symbol("MSFT");
    sleep(Duration::from_secs(3)).await;
    assert!(session.focused().borrow().ai_insight.is_none());
    session.select_symbol("AAPL");
    sleep(Duration::from_secs(3)).await;
    assert!(session.focused().borrow().ai_insight.is_some());
    assert_eq!(deep.calls.load(Ordering::SeqCst), 1);

    session.shutdown().await;
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_every_job() {
    let market = Arc::new(FakeMarket::default().with_symbol("AAPL", 100.0, 250));
    let news = Arc::new(FakeNews::default());
    let providers = SessionProviders::new(market.clone(), news.clone())
        .with_deep_analysis(Arc::new(FakeDeepAnalysis::default()));
    let session = DashboardSession::start(
        config("AAPL", SchedulerConfig::default()),
        providers,
        watchlist(&["AAPL"]),
    );

    sleep(Duration::from_millis(10)).await;
    assert_eq!(
        session.job_names(),
        vec![
            "deep-analysis",
            "focused-fast",
            "focused-slow",
            "global-batch",
            "global-deep",
            "global-slow-detail",
        ]
    );

    session.shutdown().await;
    assert!(session.job_names().is_empty());

    let calls = market.history_count("AAPL");
    sleep(Duration::from_secs(120)).await;
    assert_eq!(market.history_count("AAPL"), calls);
}
