//! Configuration for the AI extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the AI extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum document size sent to the model (bytes)
    pub max_document_bytes: usize,

    /// Characters of model output kept as `rawText` when the model omits it
    pub raw_text_excerpt_chars: usize,

    /// Maximum time for a single model call (seconds)
    pub extraction_timeout_secs: u64,
}

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_document_bytes == 0 {
            return Err("max_document_bytes must be greater than 0".to_string());
        }
        if self.raw_text_excerpt_chars == 0 {
            return Err("raw_text_excerpt_chars must be greater than 0".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
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

impl Default for ExtractorConfig {
    /// 20 MB documents, 1000-char excerpts, 120 s per call
    fn default() -> Self {
        Self {
            max_document_bytes: 20 * 1024 * 1024,
            raw_text_excerpt_chars: 1000,
            extraction_timeout_secs: 120,
        }
    }
}
