//! Headline relevance filtering and change detection for the focused symbol.

use crate::services::signals::SentimentScorer;
use crate::types::{NewsDigest, NewsItem};
use std::collections::BTreeSet;

/// Ticker root used for matching headlines: `BTC-USD` -> `BTC`,
/// `EURUSD=X` -> `EURUSD`, `SAP.DE` -> `SAP`, `^GSPC` -> `GSPC`.
pub fn symbol_root(symbol: &str) -> String {
    symbol
        .trim_start_matches('^')
        .split(['-', '=', '.'])
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

fn mentions_ticker(text: &str, root: &str) -> bool {
    !root.is_empty()
        && text
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word.eq_ignore_ascii_case(root))
}

fn mentions_name(text: &str, name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && text.to_lowercase().contains(&name.to_lowercase())
}

/// Whether `item` talks about `symbol` (or the company `name`) in its title or publisher.
pub fn is_relevant(item: &NewsItem, symbol: &str, name: Option<&str>) -> bool {
    let root = symbol_root(symbol);
    [item.title.as_str(), item.publisher.as_str()].iter().any(|text| {
        mentions_ticker(text, &root) || name.is_some_and(|n| mentions_name(text, n))
    })
}

/// Relevant items in provider order, at most `cap` of them.
pub fn filter_relevant(
    items: Vec<NewsItem>,
    symbol: &str,
    name: Option<&str>,
    cap: usize,
) -> Vec<NewsItem> {
    items
        .into_iter()
        .filter(|item| is_relevant(item, symbol, name))
        .take(cap)
        .collect()
}

/// Score the headlines of `items` into a digest.
pub fn build_digest(symbol: &str, items: Vec<NewsItem>, scorer: &SentimentScorer) -> NewsDigest {
    let headlines: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    let sentiment = scorer.score(&headlines);
    NewsDigest {
        symbol: symbol.to_uppercase(),
        items,
        sentiment,
    }
}

/// True when the article set or the sentiment score differs from `previous`.
pub fn digest_changed(previous: Option<&NewsDigest>, next: &NewsDigest) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    if previous.symbol != next.symbol || previous.sentiment.score != next.sentiment.score {
        return true;
    }
    let old_ids: BTreeSet<&str> = previous.article_ids().into_iter().collect();
    let new_ids: BTreeSet<&str> = next.article_ids().into_iter().collect();
    old_ids != new_ids
}
