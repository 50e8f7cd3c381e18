pub mod apify;
pub mod reddit;
pub mod youtube;

pub use apify::ApifyProvider;
pub use reddit::RedditRisingProvider;
pub use youtube::YoutubeProvider;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use metrics::histogram;
use serde_json::Value;

use crate::config::HttpConfig;

/// Shared HTTP client. Per-request timeouts are set by each provider.
pub fn build_http_client(cfg: &HttpConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(cfg.user_agent.as_str())
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .build()
        .context("building reqwest client")
}

/// Send a prepared GET, require a 2xx status, decode the JSON body.
pub(crate) async fn get_json(req: reqwest::RequestBuilder, provider: &'static str) -> Result<Value> {
    let t0 = std::time::Instant::now();
    let resp = req
        .send()
        .await
        .with_context(|| format!("{provider} http get()"))?
        .error_for_status()
        .with_context(|| format!("{provider} http status"))?;
    let body: Value = resp
        .json()
        .await
        .with_context(|| format!("{provider} json body"))?;

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("trends_fetch_ms", "provider" => provider).record(ms);
    Ok(body)
}

/// Emits a "not configured" warning the first time only.
#[derive(Debug, Default)]
pub(crate) struct WarnOnce(AtomicBool);

impl WarnOnce {
    pub(crate) fn warn(&self, provider: &'static str, msg: &str) {
        if !self.0.swap(true, Ordering::Relaxed) {
            tracing::warn!(provider, "{msg}");
        }
    }
}
