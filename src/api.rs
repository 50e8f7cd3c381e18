use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::aggregator::TrendAggregator;
use crate::cache::TrendCache;
use crate::config::LimitsConfig;
use crate::error::{Result, TrendError};
use crate::ingest::types::{FetchOptions, PlatformFilter};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<TrendAggregator>,
    pub cache: Arc<TrendCache>,
    pub limits: LimitsConfig,
}

impl AppState {
    pub fn new(aggregator: Arc<TrendAggregator>, cache: Arc<TrendCache>, limits: LimitsConfig) -> Self {
        Self {
            aggregator,
            cache,
            limits,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/trends/unified", get(unified_trends))
        .route("/trends/search", get(search_trends))
        .route("/admin/cache/clear", post(clear_cache))
        .route("/admin/cache/{key}", delete(invalidate_key))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendsQuery {
    #[serde(default)]
    pub platform: Option<String>,
    /// Kept as text so a bad value gets the JSON error body.
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Comma-separated list, e.g. `rust,gaming`.
    #[serde(default)]
    pub subreddits: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

impl TrendsQuery {
    fn filter(&self) -> Result<PlatformFilter> {
        self.platform.as_deref().unwrap_or("all").parse()
    }

    fn limit(&self) -> Result<Option<usize>> {
        match self.limit.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                TrendError::invalid(format!("limit must be a non-negative integer, got '{raw}'"))
            }),
        }
    }

    fn options(&self, limits: &LimitsConfig) -> Result<FetchOptions> {
        let subreddits = self.subreddits.as_deref().map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        });
        Ok(FetchOptions {
            category: self.category.clone(),
            limit: Some(limits.clamp(self.limit()?)),
            subreddits,
        })
    }
}

async fn unified_trends(
    State(state): State<AppState>,
    Query(q): Query<TrendsQuery>,
) -> Result<Json<Value>> {
    let filter = q.filter()?;
    let options = q.options(&state.limits)?;
    let items = state.aggregator.aggregate(&filter, &options).await?;

    Ok(Json(json!({
        "success": true,
        "total": items.len(),
        "items": items,
        "platform": filter.to_string(),
        "timestamp": Utc::now(),
    })))
}

async fn search_trends(
    State(state): State<AppState>,
    Query(q): Query<TrendsQuery>,
) -> Result<Json<Value>> {
    let query = q
        .q
        .clone()
        .ok_or_else(|| TrendError::invalid("missing query parameter 'q'"))?;
    let filter = q.filter()?;
    let options = q.options(&state.limits)?;
    let items = state.aggregator.search(&filter, &options, &query).await?;

    Ok(Json(json!({
        "success": true,
        "query": query.trim(),
        "total": items.len(),
        "items": items,
        "platform": filter.to_string(),
        "timestamp": Utc::now(),
    })))
}

async fn clear_cache(State(state): State<AppState>) -> Json<Value> {
    let cleared = state.cache.len();
    state.cache.clear();
    tracing::info!(cleared, "cache cleared via admin endpoint");
    Json(json!({ "success": true, "cleared": cleared }))
}

async fn invalidate_key(State(state): State<AppState>, Path(key): Path<String>) -> Json<Value> {
    state.cache.invalidate(&key);
    tracing::info!(%key, "cache key invalidated via admin endpoint");
    Json(json!({ "success": true, "key": key }))
}
