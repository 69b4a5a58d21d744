//! Error types for job execution

use menudraft_domain::JobId;
use thiserror::Error;

/// Errors returned by [`JobRunner`](crate::JobRunner)
///
/// Only `ExtractionFailed` is recorded on the job. The rest leave the job
/// as it was and go back to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// Missing or malformed identifier (caller bug, never retried)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Job or attachment does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The organization used up its window; the job stays runnable
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the window resets
        retry_after_secs: u64,
    },

    /// Another invocation owns the job
    #[error("Job {0} is already being processed")]
    InProgress(JobId),

    /// Extraction failed; the message is persisted on the job
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Persistence failure
    #[error("Repository error: {0}")]
    Repository(String),
}
