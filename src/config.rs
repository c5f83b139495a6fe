use crate::services::signals::ranking::RankingWeights;
use crate::types::TradingMode;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cadences and batching limits for the refresh tracks.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Focused symbol price + indicator refresh.
    pub focused_fast: Duration,
    /// Focused symbol news + sentiment refresh.
    pub focused_slow: Duration,
    /// Price-only refresh of the whole watchlist.
    pub global_batch: Duration,
    /// Full recommendation recomputation of the whole watchlist.
    pub global_deep: Duration,
    /// Symbols per global-deep chunk.
    pub deep_chunk_size: usize,
    /// Pause between global-deep chunks.
    pub deep_chunk_cooldown: Duration,
    /// Price + sentiment refresh of background symbols.
    pub slow_detail: Duration,
    /// Maximum symbols visited by one slow-detail pass.
    pub slow_detail_cap: usize,
    /// Symbols per slow-detail chunk.
    pub slow_detail_chunk_size: usize,
    /// Pause between slow-detail chunks.
    pub slow_detail_chunk_delay: Duration,
    /// Quiet period before a deep-analysis request fires.
    pub insight_debounce: Duration,
    /// Hard abort for article scraping.
    pub scrape_timeout: Duration,
    /// How long a last-known focused analysis may be served on restart.
    pub focused_cache_ttl: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            focused_fast: Duration::from_millis(1_000),
            focused_slow: Duration::from_millis(30_000),
            global_batch: Duration::from_millis(1_000),
            global_deep: Duration::from_millis(60_000),
            deep_chunk_size: 10,
            deep_chunk_cooldown: Duration::from_millis(1_000),
            slow_detail: Duration::from_millis(30_000),
            slow_detail_cap: 10,
            slow_detail_chunk_size: 3,
            slow_detail_chunk_delay: Duration::from_millis(1_000),
            insight_debounce: Duration::from_millis(1_500),
            scrape_timeout: Duration::from_millis(5_000),
            focused_cache_ttl: Duration::from_millis(300_000),
        }
    }
}

impl SchedulerConfig {
    /// Load scheduler settings from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            focused_fast: env_millis("FOCUSED_FAST_MS", defaults.focused_fast),
            focused_slow: env_millis("FOCUSED_SLOW_MS", defaults.focused_slow),
            global_batch: env_millis("GLOBAL_BATCH_MS", defaults.global_batch),
            global_deep: env_millis("GLOBAL_DEEP_MS", defaults.global_deep),
            deep_chunk_size: env_parse("DEEP_CHUNK_SIZE", defaults.deep_chunk_size).max(1),
            deep_chunk_cooldown: env_millis("DEEP_CHUNK_COOLDOWN_MS", defaults.deep_chunk_cooldown),
            slow_detail: env_millis("SLOW_DETAIL_MS", defaults.slow_detail),
            slow_detail_cap: env_parse("SLOW_DETAIL_CAP", defaults.slow_detail_cap),
            slow_detail_chunk_size: env_parse(
                "SLOW_DETAIL_CHUNK_SIZE",
                defaults.slow_detail_chunk_size,
            )
            .max(1),
            slow_detail_chunk_delay: env_millis(
                "SLOW_DETAIL_CHUNK_DELAY_MS",
                defaults.slow_detail_chunk_delay,
            ),
            insight_debounce: env_millis("INSIGHT_DEBOUNCE_MS", defaults.insight_debounce),
            scrape_timeout: env_millis("SCRAPE_TIMEOUT_MS", defaults.scrape_timeout),
            focused_cache_ttl: env_millis("FOCUSED_CACHE_TTL_MS", defaults.focused_cache_ttl),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Symbol focused when a session starts.
    pub default_symbol: String,
    /// Mode a session starts in.
    pub default_mode: TradingMode,
    /// Calendar days of daily history requested per symbol.
    pub history_lookback_days: u32,
    /// Below this many bars the global tracks skip a symbol.
    pub min_history_bars: usize,
    /// Headlines requested from the news provider.
    pub news_fetch_count: usize,
    /// Headlines kept after relevance filtering.
    pub news_relevance_cap: usize,
    /// Anthropic API key for deep analysis (optional).
    pub anthropic_api_key: Option<String>,
    /// Model used for deep analysis.
    pub anthropic_model: String,
    /// Sort weights for the Recommendation ordering.
    pub ranking_weights: RankingWeights,
    /// Refresh track settings.
    pub scheduler: SchedulerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_symbol: "AAPL".to_string(),
            default_mode: TradingMode::Swing,
            history_lookback_days: 400,
            min_history_bars: 50,
            news_fetch_count: 10,
            news_relevance_cap: 8,
            anthropic_api_key: None,
            anthropic_model: "claude-3-haiku-20240307".to_string(),
            ranking_weights: RankingWeights::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // Format: "strong_long,strong_short,long,short,wait"
        let ranking_weights = env::var("RANK_WEIGHTS")
            .ok()
            .and_then(|s| RankingWeights::parse(&s))
            .unwrap_or(defaults.ranking_weights);

        Self {
            default_symbol: env::var("DEFAULT_SYMBOL")
                .map(|s| s.to_uppercase())
                .unwrap_or(defaults.default_symbol),
            default_mode: env::var("TRADING_MODE")
                .ok()
                .and_then(|m| TradingMode::from_str(&m))
                .unwrap_or(defaults.default_mode),
            history_lookback_days: env_parse("HISTORY_LOOKBACK_DAYS", defaults.history_lookback_days),
            min_history_bars: env_parse("MIN_HISTORY_BARS", defaults.min_history_bars),
            news_fetch_count: env_parse("NEWS_FETCH_COUNT", defaults.news_fetch_count),
            news_relevance_cap: env_parse("NEWS_RELEVANCE_CAP", defaults.news_relevance_cap),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()),
            anthropic_model: env::var("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic_model),
            ranking_weights,
            scheduler: SchedulerConfig::from_env(),
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_millis(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
