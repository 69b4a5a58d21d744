//! Error types for rate limiting

use thiserror::Error;

/// Errors that can occur during rate limiting
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LimiterError {
    /// The key used up its window; retry after the given number of seconds
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimitExceeded {
        /// Seconds until the current window resets
        retry_after_secs: u64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sweep worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}
