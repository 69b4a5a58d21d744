//! Configuration for rate limiting
//!
//! Defines the fixed window and the sweep interval.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Key prefix used when a configuration leaves it empty
pub const DEFAULT_KEY_PREFIX: &str = "default";

/// Configuration for a fixed-window rate limit
///
/// # Examples
///
/// ```
/// use menudraft_limiter::RateLimitConfig;
///
/// // 20 requests per minute
/// let config = RateLimitConfig::default();
/// assert_eq!(config.limit, 20);
///
/// // Tighter window for expensive endpoints
/// let config = RateLimitConfig::strict();
/// assert_eq!(config.limit, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    /// Default: 20
    pub limit: u32,

    /// Window length (in seconds)
    /// Default: 60
    pub window_secs: u64,

    /// Namespace prepended to every key (`prefix:key`)
    /// Default: "ocr"
    pub key_prefix: String,

    /// How often expired records are swept (in seconds)
    /// Default: 300
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    /// 20 requests per 60 s window, swept every 5 minutes
    fn default() -> Self {
        Self {
            limit: 20,
            window_secs: 60,
            key_prefix: "ocr".to_string(),
            sweep_interval_secs: 300,
        }
    }
}

impl RateLimitConfig {
    /// Strict configuration: 5 requests per minute
    pub fn strict() -> Self {
        Self {
            limit: 5,
            ..Self::default()
        }
    }

    /// Lenient configuration: 100 requests per minute
    pub fn lenient() -> Self {
        Self {
            limit: 100,
            ..Self::default()
        }
    }

    /// Use a different key prefix
    pub fn with_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Window length in milliseconds
    pub fn window_ms(&self) -> u64 {
        self.window_secs.saturating_mul(1000)
    }

    /// Get the sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Prefix actually applied to keys
    pub fn effective_prefix(&self) -> &str {
        if self.key_prefix.trim().is_empty() {
            DEFAULT_KEY_PREFIX
        } else {
            &self.key_prefix
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.limit == 0 {
            return Err("limit must be greater than 0".to_string());
        }
        if self.window_secs == 0 {
            return Err("window_secs must be greater than 0".to_string());
        }
        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
