//! # TTL Cache
//! Process-wide key → value store with per-entry expiry, shared by every
//! provider through an `Arc`.
//!
//! - `get` hands out an owned clone; nothing outside holds a reference into the store.
//! - Expired entries are removed lazily on `get` and proactively by a background
//!   sweep that can be started and stopped explicitly.
//! - Time comes from `tokio::time::Instant`, so a paused test clock drives expiry.
//!
//! Check-then-populate is not atomic: two callers that miss the same key at the
//! same time will both fetch upstream and the last `set` wins.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use metrics::counter;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::ingest::types::TrendItem;

pub const DEFAULT_TTL: Duration = Duration::from_secs(20 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Cache holding normalized provider results.
pub type TrendCache = TtlCache<Vec<TrendItem>>;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    data: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

pub struct TtlCache<V> {
    store: Mutex<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Cache without a background sweep (expired entries still go on `get`).
    pub fn new(default_ttl: Duration) -> Self {
        crate::metrics::ensure_metrics_described();
        Self {
            store: Mutex::new(HashMap::new()),
            default_ttl,
            sweeper: Mutex::new(None),
        }
    }

    /// Shared cache with the periodic sweep already running.
    /// Must be called from within a Tokio runtime.
    pub fn start(default_ttl: Duration, sweep_every: Duration) -> Arc<Self> {
        let cache = Arc::new(Self::new(default_ttl));
        cache.start_sweeper(sweep_every);
        cache
    }

    /// Value for `key` if present and fresh. An expired entry is removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut store = self.store.lock();
        if let Some(entry) = store.get(key) {
            if !entry.is_expired(now) {
                counter!("trends_cache_hits_total").increment(1);
                return Some(entry.data.clone());
            }
            store.remove(key);
        }
        counter!("trends_cache_misses_total").increment(1);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            data: value,
            expires_at: Instant::now() + ttl,
        };
        self.store.lock().insert(key.into(), entry);
    }

    pub fn invalidate(&self, key: &str) {
        self.store.lock().remove(key);
    }

    pub fn clear(&self) {
        self.store.lock().clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired entry; returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut store = self.store.lock();
        let before = store.len();
        store.retain(|_, e| !e.is_expired(now));
        let removed = before - store.len();
        if removed > 0 {
            counter!("trends_cache_swept_total").increment(removed as u64);
        }
        removed
    }

    /// Spawn the periodic sweep. Returns `false` if one is already running.
    pub fn start_sweeper(self: &Arc<Self>, every: Duration) -> bool {
        let mut slot = self.sweeper.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(spawn_sweeper(Arc::downgrade(self), every));
        tracing::debug!(target: "cache", every_secs = every.as_secs(), "cache sweeper started");
        true
    }

    /// Stop the sweep and wait for the task to finish. Returns `false` if none was running.
    pub async fn stop_sweeper(&self) -> bool {
        let handle = self.sweeper.lock().take();
        match handle {
            Some(h) => {
                h.stop().await;
                tracing::debug!(target: "cache", "cache sweeper stopped");
                true
            }
            None => false,
        }
    }

    pub fn sweeper_running(&self) -> bool {
        self.sweeper.lock().is_some()
    }
}

/// Owns the background sweep task. Dropping it aborts the task.
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn spawn_sweeper<V>(cache: Weak<TtlCache<V>>, every: Duration) -> SweeperHandle
where
    V: Clone + Send + Sync + 'static,
{
    let (tx, mut rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = &mut rx => break,
                _ = ticker.tick() => {
                    let Some(live) = cache.upgrade() else { break };
                    let removed = live.purge_expired();
                    if removed > 0 {
                        tracing::debug!(target: "cache", removed, "swept expired entries");
                    }
                }
            }
        }
    });
    SweeperHandle {
        shutdown: Some(tx),
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache: TtlCache<u32> = TtlCache::new(DEFAULT_TTL);
        cache.set_with_ttl("k", 7, Duration::from_secs(10));
        assert_eq!(cache.get("k"), Some(7));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.get("k"), Some(7), "still fresh exactly at expiry");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "expired entry is evicted on read");
    }

    #[test]
    fn set_overwrites_and_invalidate_is_idempotent() {
        let cache: TtlCache<String> = TtlCache::new(DEFAULT_TTL);
        cache.set("a", "one".to_string());
        cache.set("a", "two".to_string());
        assert_eq!(cache.get("a").as_deref(), Some("two"));

        cache.invalidate("a");
        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
    }
}
