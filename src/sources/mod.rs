//! Upstream collaborators: market data, news, LLM analysis and article scraping.
//!
//! The scheduler only sees these traits, so tests drive it with in-memory
//! providers.

pub mod anthropic;
pub mod yahoo;

pub use anthropic::AnthropicClient;
pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use crate::types::{AiInsight, HistoryRequest, NewsItem, PriceBar, Quote};
use async_trait::async_trait;

/// Price history and live quotes.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Ordered daily bars for `symbol` within `request`.
    async fn history(&self, symbol: &str, request: HistoryRequest) -> Result<Vec<PriceBar>>;

    /// Latest quotes for a batch of symbols. Unknown symbols are omitted.
    async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>>;
}

/// Headlines for a symbol.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn news(&self, symbol: &str, count: usize) -> Result<Vec<NewsItem>>;
}

/// Produces a deep-analysis insight from aggregated article text.
#[async_trait]
pub trait DeepAnalysisProvider: Send + Sync {
    async fn analyze(&self, symbol: &str, text: &str) -> Result<AiInsight>;
}

/// Fetches readable article text. `Ok(None)` means nothing usable (paywall, empty page).
#[async_trait]
pub trait ArticleScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<Option<String>>;
}

/// Scraper that never returns text, so deep analysis uses headline summaries.
pub struct HeadlineOnlyScraper;

#[async_trait]
impl ArticleScraper for HeadlineOnlyScraper {
    async fn scrape(&self, _url: &str) -> Result<Option<String>> {
        Ok(None)
    }
}
