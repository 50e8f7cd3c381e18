use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("trends_cache_hits_total", "Cache lookups served from memory.");
        describe_counter!(
            "trends_cache_misses_total",
            "Cache lookups that found nothing or an expired entry."
        );
        describe_counter!(
            "trends_cache_swept_total",
            "Expired entries removed by the background sweep."
        );
        describe_counter!(
            "trends_provider_errors_total",
            "Provider or channel fetches that failed and contributed nothing."
        );
        describe_counter!(
            "trends_provider_items_total",
            "Items contributed by providers to aggregations."
        );
        describe_histogram!("trends_fetch_ms", "Upstream fetch time in milliseconds.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder.
    pub fn install() -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
