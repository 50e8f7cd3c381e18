//! Integration tests for the shared TTL cache and its background sweeper.
//!
//! Covered:
//! - sweeper removes expired entries without any `get`
//! - stopping the sweeper leaves expired entries in place (lazy eviction only)
//! - a second `start_sweeper` is refused; `stop_sweeper` twice is harmless
//! - values handed out by `get` are owned snapshots
//!
//! Time is paused, so `sleep` auto-advances the clock deterministically.

use std::time::Duration;

use chrono::DateTime;
use tokio::time::sleep;

use trend_aggregator::cache::{TrendCache, TtlCache};
use trend_aggregator::{Platform, TrendItem, TrendType};

fn item(id: &str) -> TrendItem {
    TrendItem {
        id: id.to_string(),
        title: "original".to_string(),
        source: Platform::Reddit,
        url: String::new(),
        momentum_score: 1.0,
        kind: TrendType::Keyword,
        timestamp: DateTime::from_timestamp(0, 0).unwrap(),
    }
}

#[tokio::test(start_paused = true)]
async fn sweeper_purges_expired_entries() {
    let cache: std::sync::Arc<TtlCache<u32>> =
        TtlCache::start(Duration::from_secs(10), Duration::from_secs(5));
    assert!(cache.sweeper_running());

    cache.set("short", 1);
    cache.set_with_ttl("long", 2, Duration::from_secs(60));
    assert_eq!(cache.len(), 2);

    // Ticks at 5s, 10s (still fresh) and 15s (expired).
    sleep(Duration::from_secs(16)).await;
    assert_eq!(cache.len(), 1, "expired entry swept without a read");
    assert_eq!(cache.get("long"), Some(2));

    assert!(cache.stop_sweeper().await);
}

#[tokio::test(start_paused = true)]
async fn stopped_sweeper_leaves_eviction_to_reads() {
    let cache: std::sync::Arc<TtlCache<u32>> =
        TtlCache::start(Duration::from_secs(1), Duration::from_secs(2));

    assert!(cache.stop_sweeper().await);
    assert!(!cache.sweeper_running());
    assert!(!cache.stop_sweeper().await, "second stop is a no-op");

    cache.set("k", 7);
    sleep(Duration::from_secs(20)).await;
    assert_eq!(cache.len(), 1, "nothing swept after stop");
    assert_eq!(cache.get("k"), None);
    assert!(cache.is_empty());

    // Manual purge still works.
    cache.set("j", 8);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(cache.purge_expired(), 1);
}

#[tokio::test(start_paused = true)]
async fn sweeper_cannot_be_started_twice() {
    let cache = TrendCache::start(Duration::from_secs(60), Duration::from_secs(5));
    assert!(!cache.start_sweeper(Duration::from_secs(1)));
    assert!(cache.stop_sweeper().await);
    assert!(cache.start_sweeper(Duration::from_secs(1)), "restart after stop");
    assert!(cache.stop_sweeper().await);
}

#[tokio::test]
async fn get_returns_an_owned_snapshot() {
    let cache = TrendCache::new(Duration::from_secs(60));
    cache.set("reddit:rising:rust:5", vec![item("reddit_a")]);

    let mut snapshot = cache.get("reddit:rising:rust:5").unwrap();
    snapshot[0].title = "mutated".to_string();
    snapshot.push(item("reddit_b"));

    let again = cache.get("reddit:rising:rust:5").unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].title, "original");
}

#[tokio::test]
async fn clear_and_invalidate() {
    let cache = TrendCache::new(Duration::from_secs(60));
    cache.set("a", vec![item("x")]);
    cache.set("b", vec![]);
    cache.invalidate("a");
    cache.invalidate("missing");
    assert_eq!(cache.len(), 1);
    cache.clear();
    assert!(cache.is_empty());
}
