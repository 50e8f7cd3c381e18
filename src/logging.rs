//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise `trend_aggregator=info,warn`.
//! `TRENDS_LOG_FORMAT=json` switches to JSON lines for hosted environments.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "TRENDS_LOG_FORMAT";
const DEFAULT_FILTER: &str = "trend_aggregator=info,warn";

/// Install the global subscriber. Errors if one is already installed
/// (callers that may run twice can ignore the result).
pub fn init_tracing() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    let res = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };

    res.map_err(|e| anyhow!("failed to initialize tracing subscriber: {e}"))?;
    tracing::debug!(json, "tracing initialized");
    Ok(())
}
