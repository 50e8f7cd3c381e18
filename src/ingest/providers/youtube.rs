//! YouTube Data API v3 adapter (`videos?chart=mostPopular`).
//!
//! Requires an API key; without one the provider is disabled. Videos under
//! `min_views` are dropped as noise, and an optional category filter is applied
//! after mapping `snippet.categoryId` to a name.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::WarnOnce;
use crate::cache::TrendCache;
use crate::config::YoutubeConfig;
use crate::ingest::fields::{first_id, first_str, first_timestamp, first_u64};
use crate::ingest::normalize_title;
use crate::ingest::scoring::youtube_momentum;
use crate::ingest::types::{FetchOptions, Platform, TrendItem, TrendProvider, TrendType};

pub const NAMESPACE: &str = "youtube:trending";

/// Hard ceiling of the `maxResults` parameter.
const API_MAX_RESULTS: u32 = 50;

/// Category name for a YouTube `categoryId`.
pub fn category_name(category_id: &str) -> &'static str {
    match category_id {
        "1" => "film",
        "2" => "autos",
        "10" => "music",
        "15" => "pets",
        "17" => "sports",
        "19" => "travel",
        "20" => "gaming",
        "22" => "people",
        "23" => "comedy",
        "24" => "entertainment",
        "25" => "news",
        "26" => "howto",
        "27" => "education",
        "28" => "science",
        _ => "entertainment",
    }
}

pub struct YoutubeProvider {
    client: reqwest::Client,
    cache: Arc<TrendCache>,
    cfg: YoutubeConfig,
    unconfigured: WarnOnce,
}

impl YoutubeProvider {
    pub fn new(client: reqwest::Client, cache: Arc<TrendCache>, cfg: YoutubeConfig) -> Self {
        Self {
            client,
            cache,
            cfg,
            unconfigured: WarnOnce::default(),
        }
    }

    fn max_results(&self) -> u32 {
        self.cfg.max_results.clamp(1, API_MAX_RESULTS)
    }

    pub fn cache_key(&self, options: &FetchOptions) -> String {
        format!(
            "{NAMESPACE}:{}:{}:{}",
            self.cfg.region_code,
            options.category().unwrap_or("all").to_ascii_lowercase(),
            self.max_results()
        )
    }
}

#[async_trait]
impl TrendProvider for YoutubeProvider {
    async fn fetch_trends(&self, options: &FetchOptions) -> Result<Vec<TrendItem>> {
        let Some(api_key) = self.cfg.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            self.unconfigured.warn(
                "youtube",
                "YOUTUBE_API_KEY not configured; skipping YouTube fetch",
            );
            return Ok(Vec::new());
        };

        let key = self.cache_key(options);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        tracing::info!(provider = "youtube", region = %self.cfg.region_code, "fetching most popular videos");

        let url = format!("{}/videos", self.cfg.base_url.trim_end_matches('/'));
        let req = self
            .client
            .get(url)
            .timeout(self.cfg.timeout())
            .query(&[
                ("part", "snippet,statistics"),
                ("chart", "mostPopular"),
                ("regionCode", self.cfg.region_code.as_str()),
                ("maxResults", self.max_results().to_string().as_str()),
                ("key", api_key),
            ]);
        let body = super::get_json(req, "youtube").await?;
        let items = parse_videos(&body, options.category(), self.cfg.min_views, Utc::now())?;

        self.cache.set_with_ttl(key, items.clone(), self.cfg.ttl());
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "youtube"
    }
}

/// Parse a `videos` list response, sorted by momentum descending.
pub fn parse_videos(
    body: &Value,
    category: Option<&str>,
    min_views: u64,
    now: DateTime<Utc>,
) -> Result<Vec<TrendItem>> {
    let videos = body.get("items").and_then(Value::as_array).ok_or_else(|| {
        let msg = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("response has no items array");
        anyhow!("youtube: {msg}")
    })?;

    let mut out: Vec<TrendItem> = videos
        .iter()
        .filter_map(|v| normalize_video(v, category, min_views, now))
        .collect();
    out.sort_by(|a, b| b.momentum_score.total_cmp(&a.momentum_score));
    Ok(out)
}

fn normalize_video(
    video: &Value,
    category: Option<&str>,
    min_views: u64,
    now: DateTime<Utc>,
) -> Option<TrendItem> {
    // `id` is a plain string for `videos`, an object for `search` results.
    let native_id = first_id(video, &["id"])
        .or_else(|| video.get("id").and_then(|id| first_id(id, &["videoId"])))?;

    let snippet = video.get("snippet").unwrap_or(&Value::Null);
    let stats = video.get("statistics").unwrap_or(&Value::Null);

    let views = first_u64(stats, &["viewCount"]).unwrap_or(0);
    if views < min_views {
        return None;
    }
    if let Some(wanted) = category {
        let name = category_name(first_str(snippet, &["categoryId"]).unwrap_or_default());
        if !name.eq_ignore_ascii_case(wanted) {
            return None;
        }
    }
    let likes = first_u64(stats, &["likeCount"]).unwrap_or(0);
    let comments = first_u64(stats, &["commentCount"]).unwrap_or(0);

    Some(TrendItem {
        id: Platform::Youtube.item_id(&native_id),
        title: normalize_title(first_str(snippet, &["title"])),
        source: Platform::Youtube,
        url: format!("https://www.youtube.com/watch?v={native_id}"),
        momentum_score: youtube_momentum(views, likes, comments),
        kind: TrendType::Video,
        timestamp: first_timestamp(snippet, &["publishedAt"]).unwrap_or(now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn video(id: &str, views: &str, likes: &str, comments: &str, cat: &str) -> Value {
        json!({
            "id": id,
            "snippet": { "title": format!("video {id}"), "categoryId": cat,
                         "publishedAt": "2024-05-01T12:00:00Z" },
            "statistics": { "viewCount": views, "likeCount": likes, "commentCount": comments }
        })
    }

    #[test]
    fn reference_video_scores_103() {
        let body = json!({ "items": [video("a", "100000", "5000", "300", "10")] });
        let items = parse_videos(&body, None, 10_000, Utc::now()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].momentum_score, 103.0);
        assert_eq!(items[0].url, "https://www.youtube.com/watch?v=a");
        assert_eq!(items[0].kind, TrendType::Video);
    }

    #[test]
    fn low_view_videos_are_noise() {
        let body = json!({ "items": [
            video("small", "9999", "9000", "900", "10"),
            video("big", "20000", "0", "0", "10"),
        ] });
        let items = parse_videos(&body, None, 10_000, Utc::now()).unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["youtube_big"]);
    }

    #[test]
    fn category_filter_uses_mapped_names() {
        let body = json!({ "items": [
            video("m", "50000", "1", "1", "10"),
            video("g", "50000", "1", "1", "20"),
            video("x", "50000", "1", "1", "999"),
        ] });
        let music = parse_videos(&body, Some("Music"), 10_000, Utc::now()).unwrap();
        assert_eq!(music.len(), 1);
        assert_eq!(music[0].id, "youtube_m");

        let ent = parse_videos(&body, Some("entertainment"), 10_000, Utc::now()).unwrap();
        assert_eq!(ent[0].id, "youtube_x");
    }

    #[test]
    fn api_error_message_is_surfaced() {
        let body = json!({ "error": { "code": 403, "message": "quotaExceeded" } });
        let err = parse_videos(&body, None, 0, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("quotaExceeded"));
    }
}
