// src/ingest/types.rs
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrendError;

/// Default number of items returned when the caller gives no limit.
pub const DEFAULT_LIMIT: usize = 25;

/// Upstream platform a trend came from. Also the tag used to select providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Reddit,
    Tiktok,
    Youtube,
}

impl Platform {
    /// Every platform, in the order the aggregator concatenates results.
    pub const ALL: [Platform; 3] = [Platform::Reddit, Platform::Tiktok, Platform::Youtube];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Reddit => "reddit",
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
        }
    }

    /// Globally unique id for a record of this platform.
    pub fn item_id(&self, native_id: &str) -> String {
        format!("{}_{}", self.as_str(), native_id)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = TrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reddit" => Ok(Platform::Reddit),
            "tiktok" => Ok(Platform::Tiktok),
            "youtube" => Ok(Platform::Youtube),
            _ => Err(TrendError::UnknownPlatform(s.trim().to_string())),
        }
    }
}

/// Which providers an aggregation call should fan out to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlatformFilter {
    #[default]
    All,
    Only(Vec<Platform>),
}

impl PlatformFilter {
    /// Concrete platforms, in `Platform::ALL` order, without duplicates.
    pub fn platforms(&self) -> Vec<Platform> {
        match self {
            PlatformFilter::All => Platform::ALL.to_vec(),
            PlatformFilter::Only(list) => Platform::ALL
                .into_iter()
                .filter(|p| list.contains(p))
                .collect(),
        }
    }
}

impl fmt::Display for PlatformFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformFilter::All => f.write_str("all"),
            PlatformFilter::Only(_) => {
                let tags: Vec<&str> = self.platforms().iter().map(|p| p.as_str()).collect();
                f.write_str(&tags.join(","))
            }
        }
    }
}

impl FromStr for PlatformFilter {
    type Err = TrendError;

    /// Accepts `all`, a single tag, or a comma-separated list of tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PlatformFilter::All);
        }
        let mut out = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let p: Platform = part.parse()?;
            if !out.contains(&p) {
                out.push(p);
            }
        }
        if out.is_empty() {
            return Err(TrendError::UnknownPlatform(s.to_string()));
        }
        Ok(PlatformFilter::Only(out))
    }
}

/// Content modality of a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendType {
    Audio,
    Video,
    #[serde(alias = "text")]
    Keyword,
}

/// The common currency of the system: one normalized, scored trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendItem {
    pub id: String,
    pub title: String,
    pub source: Platform,
    /// Absolute link to the original content, or "" if unresolvable.
    pub url: String,
    /// Finite and >= 0; higher means rising faster.
    pub momentum_score: f64,
    #[serde(rename = "type")]
    pub kind: TrendType,
    pub timestamp: DateTime<Utc>,
}

/// Per-call options shared by every provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Channel identifiers for multi-channel providers (subreddits).
    #[serde(default)]
    pub subreddits: Option<Vec<String>>,
}

impl FetchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_subreddits<I, S>(mut self, subs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subreddits = Some(subs.into_iter().map(Into::into).collect());
        self
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Trimmed category, `None` when absent or blank.
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// A source of trends. One implementor per upstream platform.
#[async_trait::async_trait]
pub trait TrendProvider: Send + Sync {
    async fn fetch_trends(&self, options: &FetchOptions) -> Result<Vec<TrendItem>>;
    fn name(&self) -> &'static str;
}
