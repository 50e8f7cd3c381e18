// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::{fetch_aggregated_trends, rank, TrendAggregator};
pub use crate::api::{router, AppState};
pub use crate::cache::{TrendCache, TtlCache};
pub use crate::config::TrendsConfig;
pub use crate::error::TrendError;
pub use crate::ingest::types::{
    FetchOptions, Platform, PlatformFilter, TrendItem, TrendProvider, TrendType,
};
