use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::CoreError;

/// Market listing page for CS2 (app 730) items; the item name is appended.
pub const STEAM_MARKET_BASE_URL: &str = "https://steamcommunity.com/market/listings/730/";

/// Browser UA sent to both Steam endpoints; the AJAX history endpoint
/// rejects obviously scripted clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Longest accepted price cache lifetime (one year).
pub const MAX_PRICE_CACHE_TTL_HOURS: u64 = 24 * 365;

/// Unit price of a container key when none is configured.
pub const DEFAULT_KEY_PRICE: f64 = 2.35;

/// Retry/backoff knobs for the HTTP fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 2_000,
            max_delay_ms: 128_000,
        }
    }
}

/// User-configurable settings for a run.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the market listing page, item name is appended URL-encoded.
    pub market_base_url: String,

    /// Price of one container key, used for the key spend total.
    pub key_price: f64,

    /// How long a fetched price series stays fresh.
    pub price_cache_ttl_hours: u64,

    /// Courtesy delay between two history pages.
    pub history_request_delay_ms: u64,

    /// Minimum spacing between two market requests (~25 per minute).
    pub market_request_interval_ms: u64,

    pub retry: RetrySettings,

    /// Directory holding the per-account report and snapshot files.
    pub results_dir: PathBuf,

    /// TCP connect timeout for the shared HTTP client.
    pub connect_timeout_secs: u64,

    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            market_base_url: STEAM_MARKET_BASE_URL.to_string(),
            key_price: DEFAULT_KEY_PRICE,
            price_cache_ttl_hours: 24,
            history_request_delay_ms: 1_000,
            market_request_interval_ms: 2_400,
            retry: RetrySettings::default(),
            results_dir: PathBuf::from("results"),
            connect_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Settings {
    /// Reject values that would make a run misbehave rather than fail loudly.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.market_base_url.trim().is_empty() {
            return Err(CoreError::Configuration(
                "market_base_url must not be empty".into(),
            ));
        }
        if !self.key_price.is_finite() || self.key_price < 0.0 {
            return Err(CoreError::Configuration(format!(
                "key_price must be a finite, non-negative number (got {})",
                self.key_price
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(CoreError::Configuration(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(CoreError::Configuration(format!(
                "retry.initial_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.initial_delay_ms, self.retry.max_delay_ms
            )));
        }
        if self.price_cache_ttl_hours > MAX_PRICE_CACHE_TTL_HOURS {
            return Err(CoreError::Configuration(format!(
                "price_cache_ttl_hours ({}) exceeds the maximum of {MAX_PRICE_CACHE_TTL_HOURS}",
                self.price_cache_ttl_hours
            )));
        }
        if self.results_dir.as_os_str().is_empty() {
            return Err(CoreError::Configuration(
                "results_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn price_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.price_cache_ttl_hours.saturating_mul(60 * 60))
    }

    pub fn history_request_delay(&self) -> Duration {
        Duration::from_millis(self.history_request_delay_ms)
    }

    pub fn market_request_interval(&self) -> Duration {
        Duration::from_millis(self.market_request_interval_ms)
    }
}
