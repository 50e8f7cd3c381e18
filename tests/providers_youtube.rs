//! YouTube most-popular provider against a mocked Data API.
//!
//! Covered:
//! - request parameters (part, chart, region, maxResults, key)
//! - noise floor, scoring, ordering, title decoding, object-shaped ids
//! - category filtering and its separate cache entry
//! - missing API key disables the provider without any request
//! - upstream error status yields an error from the provider

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trend_aggregator::cache::TrendCache;
use trend_aggregator::config::{HttpConfig, YoutubeConfig};
use trend_aggregator::ingest::providers::{build_http_client, YoutubeProvider};
use trend_aggregator::{FetchOptions, TrendProvider, TrendType};

fn fixture() -> Value {
    serde_json::from_str(include_str!("fixtures/youtube_most_popular.json")).expect("fixture json")
}

fn provider(server: &MockServer, api_key: Option<&str>) -> YoutubeProvider {
    let cfg = YoutubeConfig {
        base_url: server.uri(),
        api_key: api_key.map(String::from),
        ..YoutubeConfig::default()
    };
    let cache = Arc::new(TrendCache::new(Duration::from_secs(60)));
    let client = build_http_client(&HttpConfig::default()).expect("client");
    YoutubeProvider::new(client, cache, cfg)
}

#[tokio::test]
async fn most_popular_is_scored_filtered_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("part", "snippet,statistics"))
        .and(query_param("chart", "mostPopular"))
        .and(query_param("regionCode", "US"))
        .and(query_param("maxResults", "20"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture()))
        .expect(1)
        .mount(&server)
        .await;

    let yt = provider(&server, Some("test-key"));
    let items = yt.fetch_trends(&FetchOptions::default()).await.unwrap();

    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["youtube_vid_music", "youtube_vid_gaming", "youtube_vid_search"],
        "under-10k video dropped, sorted by momentum"
    );
    let scores: Vec<f64> = items.iter().map(|i| i.momentum_score).collect();
    assert_eq!(scores, vec![103.0, 81.0, 47.0]);

    assert_eq!(items[1].title, "Speedrun & commentary");
    assert_eq!(items[2].url, "https://www.youtube.com/watch?v=vid_search");
    assert!(items.iter().all(|i| i.kind == TrendType::Video));

    // Second call within TTL is served from cache (expect(1) above).
    let again = yt.fetch_trends(&FetchOptions::default()).await.unwrap();
    assert_eq!(again, items);
}

#[tokio::test]
async fn category_filter_keeps_matching_videos_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture()))
        .expect(2)
        .mount(&server)
        .await;

    let yt = provider(&server, Some("test-key"));

    let gaming = yt
        .fetch_trends(&FetchOptions::default().with_category("Gaming"))
        .await
        .unwrap();
    assert_eq!(gaming.len(), 1);
    assert_eq!(gaming[0].id, "youtube_vid_gaming");

    let all = yt.fetch_trends(&FetchOptions::default()).await.unwrap();
    assert_eq!(all.len(), 3, "unfiltered call uses its own cache key");
}

#[tokio::test]
async fn missing_key_disables_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture()))
        .expect(0)
        .mount(&server)
        .await;

    let yt = provider(&server, None);
    assert!(yt.fetch_trends(&FetchOptions::default()).await.unwrap().is_empty());
    assert!(yt.fetch_trends(&FetchOptions::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn quota_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
        .mount(&server)
        .await;

    let yt = provider(&server, Some("test-key"));
    assert!(yt.fetch_trends(&FetchOptions::default()).await.is_err());
}
