//! Configuration for job execution and the stuck-job watchdog

use menudraft_limiter::RateLimitConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider name recorded on jobs when no generative provider is configured
pub const NO_PROVIDER: &str = "none";

/// Configuration for the [`JobRunner`](crate::JobRunner)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Provider name recorded on every new job
    /// Default: "none"
    pub provider: String,

    /// Per-organization limit on `run` calls
    pub rate_limit: RateLimitConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            provider: NO_PROVIDER.to_string(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.provider.trim().is_empty() {
            return Err("provider must not be empty".to_string());
        }
        self.rate_limit.validate()
    }
}

/// Configuration for the stuck-job watchdog
///
/// # Examples
///
/// ```
/// use menudraft_runner::WatchdogConfig;
///
/// let config = WatchdogConfig::default();
/// assert_eq!(config.stuck_after_secs, 900);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Whether the watchdog runs at all
    /// Default: true
    pub enabled: bool,

    /// A job in `processing` for longer than this is requeued (in seconds)
    /// Default: 900 (15 minutes); must exceed the extraction timeout
    pub stuck_after_secs: u64,

    /// How often to look for stuck jobs (in seconds)
    /// Default: 60
    pub interval_secs: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stuck_after_secs: 900,
            interval_secs: 60,
        }
    }
}

impl WatchdogConfig {
    /// Get the stuck threshold as Duration
    pub fn stuck_after(&self) -> Duration {
        Duration::from_secs(self.stuck_after_secs)
    }

    /// Get the check interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.stuck_after_secs == 0 {
            return Err("stuck_after_secs must be greater than 0".to_string());
        }
        if self.interval_secs == 0 {
            return Err("interval_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Validate against the longest a single extraction may take
    pub fn validate_against_timeout(&self, extraction_timeout: Duration) -> Result<(), String> {
        self.validate()?;
        if self.stuck_after() <= extraction_timeout {
            return Err(format!(
                "stuck_after_secs ({}) must exceed the extraction timeout ({}s)",
                self.stuck_after_secs,
                extraction_timeout.as_secs()
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}
