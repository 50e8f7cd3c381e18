//! One-shot aggregation from the command line; prints the items as JSON.
//!
//! Usage: `trends_probe [platform] [limit] [category]`, e.g. `trends_probe reddit 10`.

use std::sync::Arc;

use anyhow::Context;
use trend_aggregator::{
    fetch_aggregated_trends, logging, FetchOptions, TrendAggregator, TrendCache, TrendsConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_tracing()?;

    let mut args = std::env::args().skip(1);
    let platform = args.next().unwrap_or_else(|| "all".to_string());
    let mut options = FetchOptions::default();
    if let Some(limit) = args.next() {
        options = options.with_limit(limit.parse().context("limit must be a number")?);
    }
    if let Some(category) = args.next() {
        options = options.with_category(category);
    }

    let cfg = TrendsConfig::load_default()?;
    let cache = Arc::new(TrendCache::new(cfg.cache.default_ttl()));
    let aggregator = TrendAggregator::from_config(&cfg, cache)?;

    let items = fetch_aggregated_trends(&aggregator, &platform, options).await?;
    println!("{}", serde_json::to_string_pretty(&items)?);
    eprintln!("{} items from '{platform}'", items.len());
    Ok(())
}
