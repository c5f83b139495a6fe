//! Yahoo Finance API client.
//!
//! Daily chart history, batch quotes and news search, all from the
//! unofficial public endpoints.

use crate::error::{AppError, Result};
use crate::sources::{MarketDataProvider, NewsProvider};
use crate::types::{HistoryRequest, NewsItem, PriceBar, Quote};
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart/";
const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";
const SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooOhlc>,
}

#[derive(Debug, Deserialize)]
struct YahooOhlc {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuoteResponse {
    quote_response: YahooQuoteResult,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteResult {
    result: Option<Vec<YahooQuote>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: String,
    regular_market_price: Option<f64>,
    post_market_price: Option<f64>,
    regular_market_change_percent: Option<f64>,
    short_name: Option<String>,
    long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooSearchResponse {
    #[serde(default)]
    news: Vec<YahooNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooNews {
    uuid: String,
    title: String,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    link: String,
    provider_publish_time: Option<i64>,
}

fn value_at(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten()
}

fn chart_to_bars(response: YahooChartResponse) -> Result<Vec<PriceBar>> {
    if let Some(error) = response.chart.error {
        return Err(AppError::NotFound(format!(
            "Yahoo API error: {} - {}",
            error.code, error.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| AppError::MalformedResponse("No results in chart response".to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let ohlc = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| AppError::MalformedResponse("No quote data in chart response".to_string()))?;

    let opens = ohlc.open.unwrap_or_default();
    let highs = ohlc.high.unwrap_or_default();
    let lows = ohlc.low.unwrap_or_default();
    let closes = ohlc.close.unwrap_or_default();
    let volumes = ohlc.volume.unwrap_or_default();

    let mut bars: Vec<PriceBar> = Vec::with_capacity(timestamps.len());
    for (i, &timestamp) in timestamps.iter().enumerate() {
        // Null bars (holidays, halted sessions) are dropped
        let (Some(open), Some(high), Some(low), Some(close)) =
            (value_at(&opens, i), value_at(&highs, i), value_at(&lows, i), value_at(&closes, i))
        else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive()) else {
            continue;
        };

        let bar = PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume: value_at(&volumes, i).unwrap_or(0.0),
        };

        // Keep dates strictly increasing; a repeated day replaces the earlier bar
        match bars.last().map(|b| b.date) {
            Some(last) if last > date => continue,
            Some(last) if last == date => {
                bars.pop();
                bars.push(bar);
            }
            _ => bars.push(bar),
        }
    }

    Ok(bars)
}

fn quotes_from_response(response: YahooQuoteResponse) -> Result<Vec<Quote>> {
    if let Some(error) = response.quote_response.error {
        return Err(AppError::ExternalApi(format!(
            "Yahoo quote error: {} - {}",
            error.code, error.description
        )));
    }

    Ok(response
        .quote_response
        .result
        .unwrap_or_default()
        .into_iter()
        .filter_map(|q| {
            let price = q.regular_market_price.or(q.post_market_price)?;
            Some(Quote {
                symbol: q.symbol.to_uppercase(),
                price,
                change_pct: q.regular_market_change_percent,
                display_name: q.short_name.or(q.long_name),
            })
        })
        .collect())
}

fn news_from_response(response: YahooSearchResponse) -> Vec<NewsItem> {
    response
        .news
        .into_iter()
        .map(|n| NewsItem {
            uuid: n.uuid,
            title: n.title,
            publisher: n.publisher,
            link: n.link,
            published_at: n
                .provider_publish_time
                .and_then(|t| Utc.timestamp_opt(t, 0).single()),
        })
        .collect()
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    client: Client,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;

        Ok(Self { client })
    }

    fn chart_url(symbol: &str) -> Result<Url> {
        let mut url = Url::parse(CHART_URL)
            .map_err(|e| AppError::Config(format!("Invalid chart URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config("Chart URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&symbol.to_uppercase());
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!("Fetching Yahoo Finance data: {}", url);

        let response = self.client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Yahoo API error: {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("Parse error: {}", e)))
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn history(&self, symbol: &str, request: HistoryRequest) -> Result<Vec<PriceBar>> {
        let period1 = Utc.from_utc_datetime(&request.start.and_time(NaiveTime::MIN));
        // period2 is exclusive; include the whole end day
        let period2 = Utc.from_utc_datetime(&request.end.and_time(NaiveTime::MIN))
            + chrono::Duration::days(1);

        let query = [
            ("period1", period1.timestamp().to_string()),
            ("period2", period2.timestamp().to_string()),
            ("interval", request.interval.as_query().to_string()),
            ("includePrePost", "false".to_string()),
        ];

        let response: YahooChartResponse =
            self.get_json(Self::chart_url(symbol)?, &query).await?;
        chart_to_bars(response)
    }

    async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let url = Url::parse(QUOTE_URL)
            .map_err(|e| AppError::Config(format!("Invalid quote URL: {}", e)))?;
        let query = [("symbols", symbols.join(","))];
        let response: YahooQuoteResponse = self.get_json(url, &query).await?;
        quotes_from_response(response)
    }
}

#[async_trait]
impl NewsProvider for YahooFinanceClient {
    async fn news(&self, symbol: &str, count: usize) -> Result<Vec<NewsItem>> {
        let url = Url::parse(SEARCH_URL)
            .map_err(|e| AppError::Config(format!("Invalid search URL: {}", e)))?;
        let query = [
            ("q", symbol.to_uppercase()),
            ("newsCount", count.to_string()),
            ("quotesCount", "0".to_string()),
        ];
        let response: YahooSearchResponse = self.get_json(url, &query).await?;
        let mut items = news_from_response(response);
        items.truncate(count);
        Ok(items)
    }
}
