//! LLM deep analysis of the focused symbol's top headlines.
//!
//! Results are cached by a hash of the top article ids, so an unchanged
//! headline set never triggers a second request.

use crate::error::Result;
use crate::services::cache::Cache;
use crate::sources::{ArticleScraper, DeepAnalysisProvider};
use crate::types::{AiInsight, NewsItem};
use futures_util::future::join_all;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Articles sent for analysis.
pub const ARTICLE_LIMIT: usize = 3;

/// Upper bound on scraped text per article, in characters.
pub const SCRAPED_TEXT_CAP: usize = 15_000;

/// SHA-256 hex of the sorted ids of the first `ARTICLE_LIMIT` items.
pub fn headline_set_hash(items: &[NewsItem]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let mut ids: Vec<&str> = items
        .iter()
        .take(ARTICLE_LIMIT)
        .map(|i| i.uuid.as_str())
        .collect();
    ids.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(ids.join("|").as_bytes());
    Some(hex::encode(hasher.finalize()))
}

/// Section for one article: scraped text when available, else title and publisher.
fn article_section(item: &NewsItem, scraped: Option<String>) -> String {
    match scraped {
        Some(text) => {
            let text: String = text.chars().take(SCRAPED_TEXT_CAP).collect();
            format!("--- Article: {} ---\n{}", item.title, text)
        }
        None => format!(
            "--- Article (Summary): {} ---\n{}. {}",
            item.title, item.title, item.publisher
        ),
    }
}

/// Scrape the top articles concurrently, each under `timeout`, and join them
/// into one analysis text in headline order.
pub async fn assemble_articles(
    items: &[NewsItem],
    scraper: &dyn ArticleScraper,
    timeout: Duration,
) -> String {
    let scrapes = items.iter().take(ARTICLE_LIMIT).map(|item| async move {
        if item.link.is_empty() {
            return None;
        }
        match tokio::time::timeout(timeout, scraper.scrape(&item.link)).await {
            Ok(Ok(text)) => text.filter(|t| !t.trim().is_empty()),
            Ok(Err(e)) => {
                debug!(link = %item.link, "Scrape failed: {}", e);
                None
            }
            Err(_) => {
                debug!(link = %item.link, "Scrape timed out after {:?}", timeout);
                None
            }
        }
    });

    let scraped = join_all(scrapes).await;

    items
        .iter()
        .zip(scraped)
        .map(|(item, text)| article_section(item, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Runs deep analysis on demand and caches results by headline-set hash.
pub struct DeepAnalysisTrigger {
    provider: Arc<dyn DeepAnalysisProvider>,
    scraper: Arc<dyn ArticleScraper>,
    insights: Cache<Arc<AiInsight>>,
    scrape_timeout: Duration,
}

impl DeepAnalysisTrigger {
    pub fn new(
        provider: Arc<dyn DeepAnalysisProvider>,
        scraper: Arc<dyn ArticleScraper>,
        scrape_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            scraper,
            insights: Cache::unbounded(),
            scrape_timeout,
        }
    }

    /// Cached insight for a headline-set hash.
    pub fn cached(&self, hash: &str) -> Option<Arc<AiInsight>> {
        self.insights.get(hash)
    }

    /// Insight for `items`, from cache when the same headline set was analysed before.
    ///
    /// Returns `Ok(None)` when there are no headlines. Failed requests are not cached.
    pub async fn analyze(&self, symbol: &str, items: &[NewsItem]) -> Result<Option<Arc<AiInsight>>> {
        let Some(hash) = headline_set_hash(items) else {
            return Ok(None);
        };

        if let Some(insight) = self.cached(&hash) {
            debug!(symbol = %symbol, hash = %hash, "Deep analysis served from cache");
            return Ok(Some(insight));
        }

        let text = assemble_articles(items, self.scraper.as_ref(), self.scrape_timeout).await;
        let insight = match self.provider.analyze(symbol, &text).await {
            Ok(insight) => Arc::new(insight),
            Err(e) => {
                warn!(symbol = %symbol, "Deep analysis failed: {}", e);
                return Err(e);
            }
        };

        info!(symbol = %symbol, score = insight.score, "Deep analysis complete");
        self.insights.insert(hash, insight.clone());
        Ok(Some(insight))
    }
}
