//! Reddit "rising" adapter using the public listing JSON
//! (`GET /r/{subreddit}/rising.json`). No credentials required.
//!
//! Subreddits are fetched concurrently and cached one by one, so overlapping
//! requests share per-channel entries.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::Value;

use crate::cache::TrendCache;
use crate::config::RedditConfig;
use crate::ingest::fields::{first_bool, first_f64, first_id, first_str, first_timestamp};
use crate::ingest::normalize_title;
use crate::ingest::scoring::reddit_momentum;
use crate::ingest::types::{FetchOptions, Platform, TrendItem, TrendProvider, TrendType};

pub const NAMESPACE: &str = "reddit:rising";

/// Public links always point at the real site, whatever `base_url` is.
const REDDIT_WEB: &str = "https://www.reddit.com";

pub fn cache_key(subreddit: &str, limit: usize) -> String {
    format!("{NAMESPACE}:{subreddit}:{limit}")
}

/// Reddit names: 2..=21 chars of ASCII letters, digits and `_`.
pub fn is_valid_subreddit(name: &str) -> bool {
    (2..=21).contains(&name.len())
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Trim, drop `r/` prefixes, blanks and invalid names, dedupe keeping first occurrence.
pub fn clean_subreddits<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for s in raw {
        let s = s.as_ref().trim();
        let s = s
            .strip_prefix("/r/")
            .or_else(|| s.strip_prefix("r/"))
            .unwrap_or(s)
            .trim_matches('/');
        if s.is_empty() || out.iter().any(|o| o.eq_ignore_ascii_case(s)) {
            continue;
        }
        if !is_valid_subreddit(s) {
            tracing::warn!(provider = "reddit", subreddit = %s, "ignoring invalid subreddit name");
            continue;
        }
        out.push(s.to_string());
    }
    out
}

/// Posts requested from each subreddit so the union covers `limit`.
pub fn per_subreddit_limit(limit: usize, subreddits: usize) -> usize {
    limit.div_ceil(subreddits.max(1)).max(1)
}

pub struct RedditRisingProvider {
    inner: Arc<Inner>,
}

struct Inner {
    client: reqwest::Client,
    cache: Arc<TrendCache>,
    cfg: RedditConfig,
}

impl RedditRisingProvider {
    pub fn new(client: reqwest::Client, cache: Arc<TrendCache>, cfg: RedditConfig) -> Self {
        Self {
            inner: Arc::new(Inner { client, cache, cfg }),
        }
    }

    /// Requested channels, or the configured defaults when none survive cleaning.
    pub fn resolve_subreddits(&self, requested: Option<&[String]>) -> Vec<String> {
        let cleaned = requested.map(clean_subreddits).unwrap_or_default();
        if cleaned.is_empty() {
            clean_subreddits(&self.inner.cfg.default_subreddits)
        } else {
            cleaned
        }
    }
}

impl Inner {
    async fn fetch_subreddit(&self, subreddit: &str, limit: usize) -> Result<Vec<TrendItem>> {
        let key = cache_key(subreddit, limit);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let url = format!(
            "{}/r/{}/rising.json",
            self.cfg.base_url.trim_end_matches('/'),
            subreddit
        );
        let req = self
            .client
            .get(url)
            .timeout(self.cfg.timeout())
            .query(&[("limit", limit.to_string())]);
        let body = super::get_json(req, "reddit").await?;
        let items = parse_listing(&body, Utc::now())
            .with_context(|| format!("parsing r/{subreddit} rising listing"))?;

        self.cache.set_with_ttl(key, items.clone(), self.cfg.ttl());
        Ok(items)
    }
}

#[async_trait]
impl TrendProvider for RedditRisingProvider {
    async fn fetch_trends(&self, options: &FetchOptions) -> Result<Vec<TrendItem>> {
        let subreddits = self.resolve_subreddits(options.subreddits.as_deref());
        let per_sub = per_subreddit_limit(options.effective_limit(), subreddits.len());

        tracing::info!(
            provider = "reddit",
            subreddits = subreddits.len(),
            per_sub,
            "fetching rising posts"
        );

        let handles: Vec<_> = subreddits
            .into_iter()
            .map(|sub| {
                let inner = Arc::clone(&self.inner);
                let name = sub.clone();
                let task = tokio::spawn(async move { inner.fetch_subreddit(&name, per_sub).await });
                (sub, task)
            })
            .collect();

        let mut items = Vec::new();
        for (sub, task) in handles {
            match task.await {
                Ok(Ok(mut v)) => items.append(&mut v),
                Ok(Err(e)) => {
                    tracing::warn!(error = ?e, provider = "reddit", subreddit = %sub, "subreddit fetch failed");
                    counter!("trends_provider_errors_total", "provider" => "reddit").increment(1);
                }
                Err(e) => {
                    tracing::error!(error = %e, provider = "reddit", subreddit = %sub, "subreddit task aborted");
                    counter!("trends_provider_errors_total", "provider" => "reddit").increment(1);
                }
            }
        }

        items.sort_by(|a, b| b.momentum_score.total_cmp(&a.momentum_score));
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}

/// Parse a listing (`{"data": {"children": [{"data": {...}}]}}`).
/// Posts without an id are dropped; an unexpected outer shape is an error.
pub fn parse_listing(body: &Value, now: DateTime<Utc>) -> Result<Vec<TrendItem>> {
    let children = body
        .pointer("/data/children")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("listing has no data.children array"))?;

    Ok(children
        .iter()
        .filter_map(|child| normalize_post(child.get("data").unwrap_or(child), now))
        .collect())
}

fn normalize_post(post: &Value, now: DateTime<Utc>) -> Option<TrendItem> {
    let native_id = first_id(post, &["id"]).or_else(|| {
        first_str(post, &["name"]).map(|n| n.trim_start_matches("t3_").to_string())
    })?;

    let url = match first_str(post, &["permalink"]) {
        Some(p) if p.starts_with('/') => format!("{REDDIT_WEB}{p}"),
        Some(p) if p.starts_with("http") => p.to_string(),
        _ => first_str(post, &["url"]).unwrap_or_default().to_string(),
    };

    let ups = first_f64(post, &["ups", "score"]).unwrap_or(0.0);
    let created = first_timestamp(post, &["created_utc", "created"]).unwrap_or(now);
    let kind = if first_bool(post, &["is_video"]).unwrap_or(false) {
        TrendType::Video
    } else {
        TrendType::Keyword
    };

    Some(TrendItem {
        id: Platform::Reddit.item_id(&native_id),
        title: normalize_title(first_str(post, &["title"])),
        source: Platform::Reddit,
        url,
        momentum_score: reddit_momentum(ups, created, now),
        kind,
        timestamp: created,
    })
}
