//! Trend Aggregator: binary entrypoint.
//! Boots the Axum HTTP server: config, shared cache with its sweeper,
//! providers, routes and `/metrics`.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;

use trend_aggregator::{
    api::{self, AppState},
    logging,
    metrics::Metrics,
    TrendAggregator, TrendCache, TrendsConfig,
};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // The hosted runtime may already own a subscriber.
    if let Err(e) = logging::init_tracing() {
        eprintln!("tracing not initialized: {e}");
    }

    let cfg = TrendsConfig::load_default()?;

    // One cache for every provider; swept in the background.
    let cache = TrendCache::start(cfg.cache.default_ttl(), cfg.cache.sweep_interval());
    let aggregator = Arc::new(TrendAggregator::from_config(&cfg, Arc::clone(&cache))?);

    tracing::info!(
        platforms = ?aggregator.platforms(),
        apify_configured = cfg.apify.endpoint.is_some(),
        youtube_configured = cfg.youtube.api_key.is_some(),
        "trend aggregator ready"
    );

    let state = AppState::new(aggregator, cache, cfg.limits.clone());
    let mut router = api::router(state);

    match Metrics::install() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
