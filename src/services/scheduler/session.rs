use super::clock::{Clock, TokioClock};
use super::jobs::{run_track, JobRegistry};
use super::tracks::{
    run_deep_analysis, AnalysisCache, FocusedFast, FocusedSlow, GlobalBatch, GlobalDeep,
    GlobalSlowDetail, TrackContext, DEEP_ANALYSIS, FOCUSED_FAST, FOCUSED_SLOW, GLOBAL_BATCH,
    GLOBAL_DEEP, GLOBAL_SLOW_DETAIL,
};
use crate::config::Config;
use crate::services::deep_analysis::DeepAnalysisTrigger;
use crate::services::signals::ranking::{filter_assets, rank_watchlist};
use crate::services::signals::{SentimentScorer, SignalAnalysis, SortOption};
use crate::services::watchlist::WatchlistCache;
use crate::sources::{
    ArticleScraper, DeepAnalysisProvider, HeadlineOnlyScraper, MarketDataProvider, NewsProvider,
};
use crate::types::{
    AiInsight, Asset, CategoryFilter, IndicatorFrame, NewsDigest, TradeRecommendation, TradingMode,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// User-controlled inputs of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub symbol: String,
    pub mode: TradingMode,
    pub watchlist: Arc<Vec<Asset>>,
    pub category: CategoryFilter,
    /// False while the host window is hidden; pauses the global batch track.
    pub visible: bool,
}

/// What the focused tracks publish for the selected symbol.
#[derive(Debug, Clone)]
pub struct FocusedSnapshot {
    pub symbol: String,
    /// Mode `analysis` was computed in.
    pub mode: TradingMode,
    pub analysis: Option<Arc<SignalAnalysis>>,
    pub news: Option<Arc<NewsDigest>>,
    pub ai_insight: Option<Arc<AiInsight>>,
    /// True only while nothing is known about the current symbol.
    pub loading: bool,
    /// Last refresh error. Never clears present data.
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl FocusedSnapshot {
    pub fn new(symbol: &str, mode: TradingMode) -> Self {
        Self {
            symbol: symbol.to_string(),
            mode,
            analysis: None,
            news: None,
            ai_insight: None,
            loading: true,
            error: None,
            last_updated: None,
        }
    }

    pub fn recommendation(&self) -> Option<&TradeRecommendation> {
        self.analysis.as_ref().map(|a| &a.recommendation)
    }

    pub fn latest(&self) -> Option<&IndicatorFrame> {
        self.analysis.as_ref().and_then(|a| a.latest())
    }
}

/// Collaborators a session talks to.
pub struct SessionProviders {
    pub market: Arc<dyn MarketDataProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub deep_analysis: Option<Arc<dyn DeepAnalysisProvider>>,
    pub scraper: Arc<dyn ArticleScraper>,
    pub clock: Arc<dyn Clock>,
}

impl SessionProviders {
    /// Providers with headline-only scraping, no deep analysis and the tokio clock.
    pub fn new(market: Arc<dyn MarketDataProvider>, news: Arc<dyn NewsProvider>) -> Self {
        Self {
            market,
            news,
            deep_analysis: None,
            scraper: Arc::new(HeadlineOnlyScraper),
            clock: Arc::new(TokioClock),
        }
    }

    pub fn with_deep_analysis(mut self, provider: Arc<dyn DeepAnalysisProvider>) -> Self {
        self.deep_analysis = Some(provider);
        self
    }

    pub fn with_scraper(mut self, scraper: Arc<dyn ArticleScraper>) -> Self {
        self.scraper = scraper;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// A mounted dashboard: the selected symbol, the watchlist and the tracks
/// keeping both fresh.
///
/// Dropping the session without calling [`DashboardSession::shutdown`] still
/// cancels every track, since they all hang off the session token.
pub struct DashboardSession {
    id: Uuid,
    ctx: Arc<TrackContext>,
    state: watch::Sender<SessionState>,
    jobs: JobRegistry,
    root: CancellationToken,
    insights: Option<Arc<DeepAnalysisTrigger>>,
}

impl DashboardSession {
    /// Start every track for `watchlist`, focused on `config.default_symbol`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: Config, providers: SessionProviders, watchlist: Vec<Asset>) -> Self {
        let initial = SessionState {
            symbol: config.default_symbol.to_uppercase(),
            mode: config.default_mode,
            watchlist: Arc::new(normalize(watchlist)),
            category: CategoryFilter::All,
            visible: true,
        };
        let (focused, _) = watch::channel(FocusedSnapshot::new(&initial.symbol, initial.mode));
        let (state, state_rx) = watch::channel(initial);

        let insights = providers.deep_analysis.map(|provider| {
            Arc::new(DeepAnalysisTrigger::new(
                provider,
                providers.scraper.clone(),
                config.scheduler.scrape_timeout,
            ))
        });

        let ctx = Arc::new(TrackContext {
            market: providers.market,
            news: providers.news,
            cache: WatchlistCache::new(),
            analyses: AnalysisCache::with_ttl(
                config.scheduler.focused_cache_ttl,
                providers.clock.clone(),
            ),
            clock: providers.clock,
            config,
            focused,
            state: state_rx,
            scorer: SentimentScorer::new(),
        });

        let root = CancellationToken::new();
        let session = Self {
            id: Uuid::new_v4(),
            ctx,
            state,
            jobs: JobRegistry::new(root.clone()),
            root,
            insights,
        };

        {
            let state = session.state.borrow();
            info!(
                session = %session.id,
                symbol = %state.symbol,
                mode = %state.mode,
                watchlist = state.watchlist.len(),
                deep_analysis = session.insights.is_some(),
                "Dashboard session started"
            );
        }

        session.start_focused_tracks(true);
        session.start_global_batch();
        session.start_global_deep();
        session.start_slow_detail();
        session
    }

    // =========================================================================
    // Controls
    // =========================================================================

    /// Focus another symbol. In-flight work for the previous one is discarded.
    pub fn select_symbol(&self, symbol: &str) {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return;
        }
        let changed = self.state.send_if_modified(|state| {
            if state.symbol == symbol {
                return false;
            }
            state.symbol = symbol.clone();
            true
        });
        if !changed {
            return;
        }

        info!(symbol = %symbol, "Selected symbol changed");
        self.reset_focus();
        self.start_focused_tracks(true);
        self.start_slow_detail();
    }

    pub fn set_mode(&self, mode: TradingMode) {
        let changed = self.state.send_if_modified(|state| {
            if state.mode == mode {
                return false;
            }
            state.mode = mode;
            true
        });
        if !changed {
            return;
        }

        info!(mode = %mode, "Trading mode changed");
        self.reset_focus();
        self.start_focused_tracks(false);
        self.start_global_deep();
        self.start_slow_detail();
    }

    /// Replace the watchlist. Cache entries of dropped symbols are evicted.
    pub fn set_watchlist(&self, watchlist: Vec<Asset>) {
        let watchlist = normalize(watchlist);
        let mut dropped = Vec::new();
        let changed = self.state.send_if_modified(|state| {
            if *state.watchlist == watchlist {
                return false;
            }
            dropped = state
                .watchlist
                .iter()
                .filter(|old| !watchlist.iter().any(|a| a.symbol == old.symbol))
                .map(|old| old.symbol.clone())
                .collect();
            state.watchlist = Arc::new(watchlist);
            true
        });
        if !changed {
            return;
        }

        for symbol in &dropped {
            self.ctx.cache.remove(symbol);
        }
        info!(
            watchlist = self.state.borrow().watchlist.len(),
            evicted = dropped.len(),
            cached = self.ctx.cache.len(),
            "Watchlist changed"
        );
        self.start_global_batch();
        self.start_global_deep();
        self.start_slow_detail();
    }

    pub fn set_category(&self, category: CategoryFilter) {
        let changed = self.state.send_if_modified(|state| {
            if state.category == category {
                return false;
            }
            state.category = category;
            true
        });
        if changed {
            self.start_slow_detail();
        }
    }

    /// Report host visibility. Hidden sessions skip global batch ticks.
    pub fn set_visible(&self, visible: bool) {
        self.state.send_if_modified(|state| {
            if state.visible == visible {
                return false;
            }
            state.visible = visible;
            true
        });
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver for the focused snapshot.
    pub fn focused(&self) -> watch::Receiver<FocusedSnapshot> {
        self.ctx.focused.subscribe()
    }

    pub fn cache(&self) -> Arc<WatchlistCache> {
        self.ctx.cache.clone()
    }

    /// Watchlist filtered by the active category and `query`, then sorted.
    pub fn ranked(&self, option: SortOption, query: &str) -> Vec<Asset> {
        let state = self.state();
        rank_watchlist(
            &state.watchlist,
            &self.ctx.cache.snapshot(),
            state.category,
            query,
            option,
            &self.ctx.config.ranking_weights,
        )
    }

    pub fn job_names(&self) -> Vec<&'static str> {
        self.jobs.names()
    }

    /// Cancel every track and wait for them to stop.
    pub async fn shutdown(&self) {
        self.jobs.shutdown().await;
        info!(session = %self.id, "Dashboard session stopped");
    }

    // =========================================================================
    // Track wiring
    // =========================================================================

    /// Point the focused snapshot at the current symbol and mode, serving a
    /// cached analysis when one is still fresh.
    fn reset_focus(&self) {
        let state = self.state();
        let cached = self
            .ctx
            .analyses
            .get(&AnalysisCache::key(&state.symbol, state.mode));

        self.ctx.focused.send_modify(|snap| {
            if snap.symbol != state.symbol {
                *snap = FocusedSnapshot::new(&state.symbol, state.mode);
            }
            // The old analysis stays labelled with its own mode until
            // focused-fast publishes one for the new mode.
            if cached.is_some() || snap.analysis.is_none() {
                snap.mode = state.mode;
            }
            if cached.is_some() {
                snap.analysis = cached;
            }
            snap.loading = snap.analysis.is_none();
        });
    }

    /// (Re)start focused-fast, plus focused-slow and deep analysis when the
    /// symbol itself changed.
    fn start_focused_tracks(&self, symbol_changed: bool) {
        let state = self.state();
        let clock = self.ctx.clock.clone();

        let fast = FocusedFast {
            ctx: self.ctx.clone(),
            symbol: state.symbol.clone(),
            mode: state.mode,
        };
        self.jobs
            .spawn(FOCUSED_FAST, |token| run_track(fast, token, clock));

        if !symbol_changed {
            return;
        }

        let name = state
            .watchlist
            .iter()
            .find(|asset| asset.symbol == state.symbol)
            .map(|asset| asset.name.clone());
        let slow = FocusedSlow {
            ctx: self.ctx.clone(),
            symbol: state.symbol.clone(),
            name,
        };
        let clock = self.ctx.clock.clone();
        self.jobs
            .spawn(FOCUSED_SLOW, |token| run_track(slow, token, clock));

        if let Some(trigger) = &self.insights {
            let ctx = self.ctx.clone();
            let trigger = trigger.clone();
            let symbol = state.symbol.clone();
            self.jobs.spawn(DEEP_ANALYSIS, |token| {
                run_deep_analysis(ctx, trigger, symbol, token)
            });
        }
    }

    fn start_global_batch(&self) {
        let state = self.state();
        let batch = GlobalBatch {
            ctx: self.ctx.clone(),
            symbols: state.watchlist.iter().map(|a| a.symbol.clone()).collect(),
        };
        let clock = self.ctx.clock.clone();
        self.jobs
            .spawn(GLOBAL_BATCH, |token| run_track(batch, token, clock));
    }

    fn start_global_deep(&self) {
        let state = self.state();
        let deep = GlobalDeep {
            ctx: self.ctx.clone(),
            symbols: state.watchlist.iter().map(|a| a.symbol.clone()).collect(),
            mode: state.mode,
        };
        let clock = self.ctx.clock.clone();
        self.jobs
            .spawn(GLOBAL_DEEP, |token| run_track(deep, token, clock));
    }

    /// Background targets are the first `slow_detail_cap` assets of the
    /// active category, minus the selected symbol.
    fn start_slow_detail(&self) {
        let state = self.state();
        let targets: Vec<Asset> = filter_assets(&state.watchlist, state.category, "")
            .into_iter()
            .take(self.ctx.config.scheduler.slow_detail_cap)
            .filter(|asset| asset.symbol != state.symbol)
            .collect();

        let detail = GlobalSlowDetail {
            ctx: self.ctx.clone(),
            targets,
            mode: state.mode,
        };
        let clock = self.ctx.clock.clone();
        self.jobs
            .spawn(GLOBAL_SLOW_DETAIL, |token| run_track(detail, token, clock));
    }
}

fn normalize(watchlist: Vec<Asset>) -> Vec<Asset> {
    watchlist.into_iter().map(Asset::normalized).collect()
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
