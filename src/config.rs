// src/config.rs
//! Runtime configuration: TOML file (all fields optional) + env overrides for
//! endpoints and credentials.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/trends.toml";
pub const ENV_CONFIG_PATH: &str = "TRENDS_CONFIG_PATH";

pub const ENV_APIFY_ENDPOINT: &str = "APIFY_ENDPOINT";
pub const ENV_APIFY_API_KEY: &str = "APIFY_API_KEY";
pub const ENV_YOUTUBE_API_KEY: &str = "YOUTUBE_API_KEY";

/// Marker meaning "read this secret from the environment".
const ENV_MARKER: &str = "ENV";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrendsConfig {
    pub cache: CacheConfig,
    pub limits: LimitsConfig,
    pub http: HttpConfig,
    pub reddit: RedditConfig,
    pub apify: ApifyConfig,
    pub youtube: YoutubeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub default_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 20 * 60,
            sweep_interval_secs: 5 * 60,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Limits enforced by the boundary layer before calling the aggregator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_limit: 25,
            max_limit: 100,
        }
    }
}

impl LimitsConfig {
    /// Requested limit, defaulted and clamped to the ceiling.
    pub fn clamp(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("trend-aggregator/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout_secs: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub base_url: String,
    pub default_subreddits: Vec<String>,
    pub ttl_secs: u64,
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            default_subreddits: ["technology", "worldnews", "gaming", "science", "music", "movies"]
                .into_iter()
                .map(String::from)
                .collect(),
            ttl_secs: 15 * 60,
            timeout_secs: 10,
        }
    }
}

impl RedditConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApifyConfig {
    /// Actor run / dataset URL or RapidAPI endpoint. Unset disables the provider.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// `Authorization` sends `Bearer <key>`; any other header sends the raw key.
    pub auth_header: String,
    pub ttl_secs: u64,
    pub timeout_secs: u64,
}

impl Default for ApifyConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            auth_header: "Authorization".to_string(),
            ttl_secs: 20 * 60,
            timeout_secs: 15,
        }
    }
}

impl ApifyConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub region_code: String,
    pub max_results: u32,
    pub min_views: u64,
    pub ttl_secs: u64,
    pub timeout_secs: u64,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            api_key: None,
            region_code: "US".to_string(),
            max_results: 20,
            min_views: crate::ingest::scoring::YOUTUBE_MIN_VIEWS,
            ttl_secs: 20 * 60,
            timeout_secs: 10,
        }
    }
}

impl YoutubeConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TrendsConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing trends config toml")
    }

    /// Load from an explicit path, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading trends config from {}", path.display()))?;
        let mut cfg = Self::from_toml_str(&content)?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $TRENDS_CONFIG_PATH (must exist)
    /// 2) config/trends.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        let mut cfg = Self::default();
        cfg.apply_env();
        Ok(cfg)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|k| std::env::var(k).ok());
    }

    /// Apply overrides from an arbitrary lookup. Non-blank env values win over
    /// the file; a file value of `"ENV"` is resolved from the lookup as well.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_APIFY_ENDPOINT) {
            self.apify.endpoint = Some(v);
        }
        if let Some(v) = get(ENV_APIFY_API_KEY) {
            self.apify.api_key = Some(v);
        } else if is_env_marker(&self.apify.api_key) {
            self.apify.api_key = None;
        }
        if let Some(v) = get(ENV_YOUTUBE_API_KEY) {
            self.youtube.api_key = Some(v);
        } else if is_env_marker(&self.youtube.api_key) {
            self.youtube.api_key = None;
        }

        // Blank values count as unset.
        for slot in [
            &mut self.apify.endpoint,
            &mut self.apify.api_key,
            &mut self.youtube.api_key,
        ] {
            if slot.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *slot = None;
            }
        }
    }
}

fn is_env_marker(v: &Option<String>) -> bool {
    v.as_deref()
        .is_some_and(|s| s.trim().eq_ignore_ascii_case(ENV_MARKER))
}
