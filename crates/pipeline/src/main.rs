//! pipeline: batch driver for the sentiment/price correlation system.
//!
//! Usage:
//!   cargo run -p pipeline -- run                  # scrape + classify + prune
//!   cargo run -p pipeline -- run --limit 200 --keep-days 90
//!   cargo run -p pipeline -- analyze TSLA --days 30
//!
//! Environment (see .env):
//!   DATABASE_URL        sqlite path, default sqlite:reddit_posts.db?mode=rwc
//!   CATALOG_PATH        listing CSV, default nasdaq-listed-symbols.csv
//!   SENTIMENT_URL       FinBERT service, default http://localhost:8003
//!   REDDIT_USER_AGENT   user agent for the listing API
//!   SUBREDDITS          comma separated, default stocks,wallstreetbets,investing

use std::collections::HashSet;
use std::time::Duration as StdDuration;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use post_store::PostStore;
use price_series::{PriceSeriesAdapter, YahooChartClient};
use reddit_client::RedditClient;
use sentiment_client::FinbertClient;
use ticker_catalog::TickerCatalog;

const DEFAULT_LIMIT: usize = 200;
const DEFAULT_KEEP_DAYS: i64 = 90;
const DEFAULT_ANALYZE_DAYS: i64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipeline=info,post_store=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("run");

    match command {
        "run" => run_cycle(&args).await,
        "analyze" => run_analyze(&args).await,
        other => bail!("unknown command '{other}' (expected 'run' or 'analyze')"),
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

async fn open_store() -> Result<PostStore> {
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:reddit_posts.db?mode=rwc".to_string());
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .with_context(|| format!("cannot open record store at {url}"))?;

    let store = PostStore::new(pool);
    store.init().await?;
    Ok(store)
}

fn load_catalog() -> Result<TickerCatalog> {
    let path =
        std::env::var("CATALOG_PATH").unwrap_or_else(|_| "nasdaq-listed-symbols.csv".to_string());

    // Comma separated tickers to exclude from the symbol pass, e.g.
    // STOP_WORDS=ON,ALL,IT for fewer common-word false positives.
    let stop_words: HashSet<String> = std::env::var("STOP_WORDS")
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    // No catalog means no extraction: this failure is fatal to the run.
    TickerCatalog::load_with_stop_words(&path, &stop_words)
        .with_context(|| format!("cannot load ticker catalog from {path}"))
}

async fn run_cycle(args: &[String]) -> Result<()> {
    let limit: usize = flag_value(args, "--limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_LIMIT);
    let keep_days: i64 = flag_value(args, "--keep-days")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_KEEP_DAYS);

    let catalog = load_catalog()?;
    let store = open_store().await?;

    let subreddits: Vec<String> = std::env::var("SUBREDDITS")
        .unwrap_or_else(|_| "stocks,wallstreetbets,investing".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let user_agent = std::env::var("REDDIT_USER_AGENT")
        .unwrap_or_else(|_| "stockpulse/0.1 (batch sentiment tracker)".to_string());
    let source = RedditClient::new(subreddits, &user_agent);

    let sentiment_url =
        std::env::var("SENTIMENT_URL").unwrap_or_else(|_| "http://localhost:8003".to_string());
    let classifier = FinbertClient::new(sentiment_url, StdDuration::from_secs(30));

    let ingested = pipeline::ingest(&source, &catalog, &store, limit).await?;
    let classified = pipeline::classify_pending(&classifier, &store).await?;
    let deleted = store.delete_older_than(Duration::days(keep_days)).await?;

    tracing::info!(
        inserted = ingested.inserted,
        classified = classified.classified,
        skipped = classified.skipped,
        deleted,
        "update cycle complete"
    );
    Ok(())
}

async fn run_analyze(args: &[String]) -> Result<()> {
    let symbol = args
        .get(2)
        .filter(|a| !a.starts_with("--"))
        .map(|s| s.to_uppercase())
        .context("usage: pipeline analyze SYMBOL [--days N]")?;
    let days: i64 = flag_value(args, "--days")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_ANALYZE_DAYS);

    let store = open_store().await?;
    let prices = PriceSeriesAdapter::new(YahooChartClient::new());

    let report = pipeline::analyze(&store, &prices, &symbol, days).await?;

    if report.correlations.is_none() {
        tracing::warn!(
            symbol = %report.symbol,
            posts = report.posts,
            combined_days = report.combined_days,
            "insufficient data for correlation"
        );
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
