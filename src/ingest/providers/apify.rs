//! Generic HTTP adapter for TikTok trending data served by an Apify actor
//! run, an Apify dataset, or a RapidAPI endpoint.
//!
//! The endpoint is configuration; without it the provider is disabled and
//! returns nothing. Momentum is the raw play count.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::WarnOnce;
use crate::cache::TrendCache;
use crate::config::ApifyConfig;
use crate::ingest::fields::{first_f64, first_id, first_str, first_timestamp};
use crate::ingest::normalize_title;
use crate::ingest::scoring::play_count_momentum;
use crate::ingest::types::{FetchOptions, Platform, TrendItem, TrendProvider, TrendType};

pub const NAMESPACE: &str = "apify:trends";

pub fn cache_key(options: &FetchOptions) -> String {
    format!(
        "{NAMESPACE}:{}:{}",
        options.category().unwrap_or("all"),
        options.effective_limit()
    )
}

pub struct ApifyProvider {
    client: reqwest::Client,
    cache: Arc<TrendCache>,
    cfg: ApifyConfig,
    unconfigured: WarnOnce,
}

impl ApifyProvider {
    pub fn new(client: reqwest::Client, cache: Arc<TrendCache>, cfg: ApifyConfig) -> Self {
        Self {
            client,
            cache,
            cfg,
            unconfigured: WarnOnce::default(),
        }
    }

    fn endpoint(&self) -> Option<&str> {
        self.cfg
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let Some(key) = self.cfg.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return req;
        };
        if self.cfg.auth_header.eq_ignore_ascii_case("authorization") {
            req.bearer_auth(key)
        } else {
            req.header(self.cfg.auth_header.as_str(), key)
        }
    }
}

#[async_trait]
impl TrendProvider for ApifyProvider {
    async fn fetch_trends(&self, options: &FetchOptions) -> Result<Vec<TrendItem>> {
        let Some(endpoint) = self.endpoint() else {
            self.unconfigured.warn(
                "tiktok",
                "APIFY_ENDPOINT not configured; skipping TikTok fetch",
            );
            return Ok(Vec::new());
        };

        let key = cache_key(options);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        tracing::info!(provider = "tiktok", "fetching trends from external endpoint");

        let mut query = vec![("limit", options.effective_limit().to_string())];
        if let Some(cat) = options.category() {
            query.push(("category", cat.to_string()));
        }
        let req = self
            .client
            .get(endpoint)
            .timeout(self.cfg.timeout())
            .query(&query);
        let body = super::get_json(self.authorize(req), "tiktok").await?;
        let items = parse_payload(&body, Utc::now())?;

        self.cache.set_with_ttl(key, items.clone(), self.cfg.ttl());
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "tiktok"
    }
}

/// Accepts a bare array or an object wrapping it under `items` or `data`.
pub fn parse_payload(body: &Value, now: DateTime<Utc>) -> Result<Vec<TrendItem>> {
    let records = body
        .as_array()
        .or_else(|| body.get("items").and_then(Value::as_array))
        .or_else(|| body.get("data").and_then(Value::as_array))
        .ok_or_else(|| anyhow!("payload is neither an array nor wraps one under items/data"))?;

    Ok(records
        .iter()
        .filter_map(|raw| normalize_record(raw, now))
        .collect())
}

fn normalize_record(raw: &Value, now: DateTime<Utc>) -> Option<TrendItem> {
    let native_id = first_id(raw, &["id", "videoId", "aweme_id"])?;
    let plays = first_f64(raw, &["playCount", "plays", "views", "viewCount"]).unwrap_or(0.0);

    Some(TrendItem {
        id: Platform::Tiktok.item_id(&native_id),
        title: normalize_title(first_str(raw, &["title", "desc", "text"])),
        source: Platform::Tiktok,
        url: first_str(raw, &["webVideoUrl", "url", "shareUrl"])
            .unwrap_or_default()
            .to_string(),
        momentum_score: play_count_momentum(plays),
        // TikTok trends are primarily audio-driven.
        kind: TrendType::Audio,
        timestamp: first_timestamp(raw, &["createTimeISO", "createTime", "created_at"])
            .unwrap_or(now),
    })
}
