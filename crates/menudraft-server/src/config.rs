//! Configuration file parsing for the service.
//!
//! Loads settings from TOML: bind address, storage locations, the
//! generative provider, rate limiting, the stuck-job watchdog and extractor
//! limits. `GEMINI_API_KEY` and `OCR_PROVIDER` override the file. Selecting
//! Gemini without any key falls back to no provider.

use menudraft_extractor::ExtractorConfig;
use menudraft_limiter::RateLimitConfig;
use menudraft_llm::gemini::{DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use menudraft_runner::WatchdogConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable selecting the provider (`gemini` or `none`)
pub const PROVIDER_ENV: &str = "OCR_PROVIDER";

/// Service configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// Field present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which generative provider handles non-text attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini
    Gemini,
    /// No provider; non-text attachments get the placeholder draft
    None,
}

impl ProviderKind {
    /// Name recorded on jobs
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::None => "none",
        }
    }

    /// Parse a provider name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(ProviderKind::Gemini),
            "none" | "" => Some(ProviderKind::None),
            _ => None,
        }
    }
}

/// Generative provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider to use
    pub kind: ProviderKind,

    /// API endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// API key; empty falls back to `GEMINI_API_KEY`
    pub api_key: String,

    /// Per-request timeout (in seconds)
    pub timeout_secs: u64,

    /// Attempts per call, including the first
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Gemini,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ProviderConfig {
    /// Get the request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Service configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// SQLite database holding jobs and attachment metadata
    pub database_path: PathBuf,

    /// Directory attachment storage locations are relative to
    pub attachments_root: PathBuf,

    /// Generative provider
    pub provider: ProviderConfig,

    /// Per-organization limit on run requests
    pub rate_limit: RateLimitConfig,

    /// Stuck-job watchdog
    pub watchdog: WatchdogConfig,

    /// AI extractor limits
    pub extractor: ExtractorConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            database_path: PathBuf::from("menudraft.db"),
            attachments_root: PathBuf::from("attachments"),
            provider: ProviderConfig::default(),
            rate_limit: RateLimitConfig::default(),
            watchdog: WatchdogConfig::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file, apply environment overrides
    /// and validate
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text, apply environment overrides and
    /// validate
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: ServiceConfig = toml::from_str(contents)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.disable_provider_without_key();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, validated
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.disable_provider_without_key();
        config.validate()?;
        Ok(config)
    }

    /// Apply `OCR_PROVIDER` and `GEMINI_API_KEY` from a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(kind) = lookup(PROVIDER_ENV) {
            self.provider.kind = ProviderKind::parse(&kind).ok_or_else(|| {
                ConfigError::Invalid(format!("{} must be 'gemini' or 'none', got '{}'", PROVIDER_ENV, kind))
            })?;
        }

        if self.provider.api_key.trim().is_empty() {
            if let Some(key) = lookup(API_KEY_ENV) {
                self.provider.api_key = key;
            }
        }
        Ok(())
    }

    /// Switch to no provider when Gemini is selected without a key
    ///
    /// Non-text attachments then get the placeholder draft. Returns whether
    /// the provider was disabled.
    pub fn disable_provider_without_key(&mut self) -> bool {
        if self.provider.kind == ProviderKind::Gemini && self.provider.api_key.trim().is_empty() {
            warn!(
                "No Gemini API key in provider.api_key or {}; non-text attachments get placeholder drafts",
                API_KEY_ENV
            );
            self.provider.kind = ProviderKind::None;
            return true;
        }
        false
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.kind == ProviderKind::Gemini && self.provider.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "provider.api_key (or {})",
                API_KEY_ENV
            )));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider.timeout_secs must be greater than 0".to_string()));
        }

        self.rate_limit
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("rate_limit: {}", e)))?;
        self.extractor
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("extractor: {}", e)))?;
        if self.watchdog.enabled {
            self.watchdog
                .validate_against_timeout(self.extractor.extraction_timeout())
                .map_err(|e| ConfigError::Invalid(format!("watchdog: {}", e)))?;
        }
        Ok(())
    }

    /// Configuration for tests: no provider, in-memory database
    pub fn default_test_config() -> Self {
        Self {
            database_path: PathBuf::from(":memory:"),
            provider: ProviderConfig {
                kind: ProviderKind::None,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
