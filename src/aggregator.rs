//! Fan-out / merge over the registered providers.
//!
//! Every selected provider runs in its own task; all tasks are joined before
//! merging. A branch that errors or panics contributes nothing and is logged.
//! Results are concatenated in platform order, stably sorted by momentum,
//! de-duplicated by id and truncated, so completion order never shows in the
//! output.

use std::collections::BTreeMap;
use std::sync::Arc;

use metrics::counter;

use crate::cache::TrendCache;
use crate::config::TrendsConfig;
use crate::error::{Result, TrendError};
use crate::ingest::providers::{
    build_http_client, ApifyProvider, RedditRisingProvider, YoutubeProvider,
};
use crate::ingest::types::{FetchOptions, Platform, PlatformFilter, TrendItem, TrendProvider};

/// Per-provider fetch size used by `search`, which filters before truncating.
pub const SEARCH_FETCH_LIMIT: usize = 100;

#[derive(Clone)]
pub struct TrendAggregator {
    providers: BTreeMap<Platform, Arc<dyn TrendProvider>>,
    search_fetch_limit: usize,
}

impl Default for TrendAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendAggregator {
    pub fn new() -> Self {
        crate::metrics::ensure_metrics_described();
        Self {
            providers: BTreeMap::new(),
            search_fetch_limit: SEARCH_FETCH_LIMIT,
        }
    }

    /// How many items each provider is asked for during `search`.
    pub fn with_search_fetch_limit(mut self, limit: usize) -> Self {
        self.search_fetch_limit = limit.max(1);
        self
    }

    /// Builder-style registration. A later provider for the same platform replaces the earlier one.
    pub fn with_provider(mut self, platform: Platform, provider: Arc<dyn TrendProvider>) -> Self {
        self.register(platform, provider);
        self
    }

    pub fn register(&mut self, platform: Platform, provider: Arc<dyn TrendProvider>) {
        self.providers.insert(platform, provider);
    }

    /// The three production providers over one HTTP client and one shared cache.
    pub fn from_config(cfg: &TrendsConfig, cache: Arc<TrendCache>) -> anyhow::Result<Self> {
        let client = build_http_client(&cfg.http)?;
        Ok(Self::new()
            .with_search_fetch_limit(cfg.limits.max_limit)
            .with_provider(
                Platform::Reddit,
                Arc::new(RedditRisingProvider::new(
                    client.clone(),
                    Arc::clone(&cache),
                    cfg.reddit.clone(),
                )),
            )
            .with_provider(
                Platform::Tiktok,
                Arc::new(ApifyProvider::new(
                    client.clone(),
                    Arc::clone(&cache),
                    cfg.apify.clone(),
                )),
            )
            .with_provider(
                Platform::Youtube,
                Arc::new(YoutubeProvider::new(client, cache, cfg.youtube.clone())),
            ))
    }

    /// Registered platforms in concatenation order.
    pub fn platforms(&self) -> Vec<Platform> {
        self.providers.keys().copied().collect()
    }

    /// Fetch from the selected providers and return the top `limit` items.
    pub async fn aggregate(
        &self,
        filter: &PlatformFilter,
        options: &FetchOptions,
    ) -> Result<Vec<TrendItem>> {
        let limit = validate_limit(options)?;
        let items = self.fan_out(filter, options).await?;
        Ok(rank(items, limit))
    }

    /// Like [`aggregate`](Self::aggregate), but keeps only titles containing `query`
    /// (case-insensitive) before truncating. Providers are asked for the search
    /// fetch size, not the caller's limit.
    pub async fn search(
        &self,
        filter: &PlatformFilter,
        options: &FetchOptions,
        query: &str,
    ) -> Result<Vec<TrendItem>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(TrendError::invalid("search query must not be empty"));
        }
        let limit = validate_limit(options)?;
        let fetch = FetchOptions {
            limit: Some(self.search_fetch_limit.max(limit)),
            ..options.clone()
        };

        let matching: Vec<TrendItem> = self
            .fan_out(filter, &fetch)
            .await?
            .into_iter()
            .filter(|it| it.title.to_lowercase().contains(&needle))
            .collect();
        Ok(rank(matching, limit))
    }

    fn select(&self, filter: &PlatformFilter) -> Result<Vec<(Platform, Arc<dyn TrendProvider>)>> {
        match filter {
            PlatformFilter::All => Ok(self
                .providers
                .iter()
                .map(|(p, prov)| (*p, Arc::clone(prov)))
                .collect()),
            PlatformFilter::Only(list) if list.is_empty() => {
                Err(TrendError::invalid("platform list must not be empty"))
            }
            PlatformFilter::Only(_) => filter
                .platforms()
                .into_iter()
                .map(|p| {
                    self.providers
                        .get(&p)
                        .map(|prov| (p, Arc::clone(prov)))
                        .ok_or(TrendError::NoProvider(p))
                })
                .collect(),
        }
    }

    /// Run the selected providers concurrently; concatenated in platform order.
    async fn fan_out(
        &self,
        filter: &PlatformFilter,
        options: &FetchOptions,
    ) -> Result<Vec<TrendItem>> {
        let selected = self.select(filter)?;

        let handles: Vec<_> = selected
            .into_iter()
            .map(|(platform, provider)| {
                let name = provider.name();
                let opts = options.clone();
                let task = tokio::spawn(async move { provider.fetch_trends(&opts).await });
                (platform, name, task)
            })
            .collect();

        let mut merged = Vec::new();
        for (platform, name, task) in handles {
            match task.await {
                Ok(Ok(mut items)) => {
                    counter!("trends_provider_items_total", "provider" => name)
                        .increment(items.len() as u64);
                    merged.append(&mut items);
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = ?e, provider = name, %platform, "provider error");
                    counter!("trends_provider_errors_total", "provider" => name).increment(1);
                }
                Err(e) => {
                    tracing::error!(error = %e, provider = name, %platform, "provider task failed");
                    counter!("trends_provider_errors_total", "provider" => name).increment(1);
                }
            }
        }
        Ok(merged)
    }
}

fn validate_limit(options: &FetchOptions) -> Result<usize> {
    match options.effective_limit() {
        0 => Err(TrendError::invalid("limit must be at least 1")),
        n => Ok(n),
    }
}

/// Stable sort by momentum (descending), drop repeated ids keeping the first, truncate.
pub fn rank(mut items: Vec<TrendItem>, limit: usize) -> Vec<TrendItem> {
    items.sort_by(|a, b| b.momentum_score.total_cmp(&a.momentum_score));
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items.retain(|it| seen.insert(it.id.clone()));
    items.truncate(limit);
    items
}

/// Parse a platform tag (`all`, `reddit`, `tiktok,youtube`, ...) and aggregate.
pub async fn fetch_aggregated_trends(
    aggregator: &TrendAggregator,
    platform: &str,
    options: FetchOptions,
) -> Result<Vec<TrendItem>> {
    let filter: PlatformFilter = platform.parse()?;
    aggregator.aggregate(&filter, &options).await
}
