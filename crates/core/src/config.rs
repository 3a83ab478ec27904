use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Thresholds and limits of the analytics panels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsightConfig {
    pub high_complexity: f64,
    pub low_impact: f64,
    pub max_debt_shown: usize,
    pub max_complex_shown: usize,
    /// Enrichment throughput used for the ETA estimate.
    pub chunks_per_minute: f64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            high_complexity: 0.6,
            low_impact: 0.7,
            max_debt_shown: 5,
            max_complex_shown: 10,
            chunks_per_minute: 2.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    pub api_url: Url,
    pub refresh_interval_secs: u64,
    pub search_limit: usize,
    pub functions_limit: usize,
    pub request_timeout_secs: u64,
    /// Initial value of the auto-refresh toggle.
    pub auto_refresh: bool,
    pub insights: InsightConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            refresh_interval_secs: 30,
            search_limit: 20,
            functions_limit: 50,
            request_timeout_secs: 30,
            auto_refresh: false,
            insights: InsightConfig::default(),
        }
    }
}

/// Per-field overrides, typically from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub refresh_interval_secs: Option<u64>,
    pub search_limit: Option<usize>,
    pub functions_limit: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub auto_refresh: Option<bool>,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let api_url = match lookup("CODEDASH_API_URL") {
            Some(raw) if !raw.trim().is_empty() => parse_api_url(&raw)?,
            _ => defaults.api_url,
        };
        Ok(Self {
            api_url,
            refresh_interval_secs: lookup_u64(&lookup, "CODEDASH_REFRESH_SECS", 30, 1, 3600),
            search_limit: lookup_u64(&lookup, "CODEDASH_SEARCH_LIMIT", 20, 1, 500) as usize,
            functions_limit: lookup_u64(&lookup, "CODEDASH_FUNCTIONS_LIMIT", 50, 1, 1000) as usize,
            request_timeout_secs: lookup_u64(&lookup, "CODEDASH_TIMEOUT_SECS", 30, 1, 600),
            auto_refresh: lookup_bool(&lookup, "CODEDASH_AUTO_REFRESH", false),
            insights: defaults.insights,
        })
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<()> {
        if let Some(value) = overrides.api_url {
            self.api_url = parse_api_url(&value)?;
        }
        if let Some(value) = overrides.refresh_interval_secs {
            self.refresh_interval_secs = value.clamp(1, 3600);
        }
        if let Some(value) = overrides.search_limit {
            self.search_limit = value.clamp(1, 500);
        }
        if let Some(value) = overrides.functions_limit {
            self.functions_limit = value.clamp(1, 1000);
        }
        if let Some(value) = overrides.request_timeout_secs {
            self.request_timeout_secs = value.clamp(1, 600);
        }
        if let Some(value) = overrides.auto_refresh {
            self.auto_refresh = value;
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| CoreError::Config(format!("invalid API URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CoreError::Config(format!(
            "unsupported API URL scheme '{}' in '{}'",
            other, raw
        ))),
    }
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default API URL is valid")
}

fn lookup_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    lookup(key)
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default)
}

fn lookup_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
    min: u64,
    max: u64,
) -> u64 {
    lookup(key)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|value| value.clamp(min, max))
        .unwrap_or(default)
}
