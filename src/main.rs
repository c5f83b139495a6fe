use std::sync::Arc;
use std::time::Duration;
use swingbot::services::SortOption;
use swingbot::sources::{AnthropicClient, YahooFinanceClient};
use swingbot::{default_watchlist, Config, DashboardSession, SessionProviders};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often the ranked watchlist is written to the log.
const REPORT_INTERVAL: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swingbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    if let Some(symbol) = std::env::args().nth(1) {
        config.default_symbol = symbol.to_uppercase();
    }
    info!(
        "Starting swingbot on {} ({} mode)",
        config.default_symbol, config.default_mode
    );

    let yahoo = Arc::new(YahooFinanceClient::new()?);
    let mut providers = SessionProviders::new(yahoo.clone(), yahoo);

    // Deep analysis is optional
    if let Some(ref api_key) = config.anthropic_api_key {
        info!("Anthropic API key found, enabling deep news analysis");
        let client = AnthropicClient::new(api_key, &config.anthropic_model)?;
        providers = providers.with_deep_analysis(Arc::new(client));
    }

    let session = DashboardSession::start(config, providers, default_watchlist());
    info!("Running jobs: {}", session.job_names().join(", "));

    let mut ticker = tokio::time::interval(REPORT_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => report(&session),
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    session.shutdown().await;
    Ok(())
}

fn report(session: &DashboardSession) {
    let focused = session.focused().borrow().clone();
    match (focused.recommendation(), focused.latest()) {
        (Some(rec), Some(frame)) => info!(
            "{} {} @ {:.2}: {} {:?} ({})",
            focused.symbol,
            focused.mode,
            frame.close(),
            rec.action.label(),
            rec.confidence,
            rec.reason
        ),
        _ if focused.loading => info!("{}: loading", focused.symbol),
        _ => info!(
            "{}: {}",
            focused.symbol,
            focused.error.as_deref().unwrap_or("no data")
        ),
    }
    if let Some(insight) = &focused.ai_insight {
        info!("{} AI score {:.0}/10: {}", focused.symbol, insight.score, insight.summary);
    }

    let cache = session.cache();
    if cache.is_empty() {
        info!("Watchlist cache still warming up");
        return;
    }
    for asset in session.ranked(SortOption::Combined, "").into_iter().take(5) {
        if let Some(entry) = cache.get(&asset.symbol) {
            info!(
                "  {:<10} {:>12} {:<6} sentiment {:+.2}",
                asset.symbol,
                entry.price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "-".into()),
                entry.recommendation.action.label(),
                entry.sentiment.score
            );
        }
    }
}
