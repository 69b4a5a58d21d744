//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur during document extraction
///
/// A malformed model response is not an error: it degrades to the
/// placeholder draft. Everything here is a real extraction failure.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error (transport, non-2xx, provider rate limit)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Document exceeds the configured size limit
    #[error("Document too large: {0} bytes (max: {1})")]
    DocumentTooLarge(usize, usize),

    /// The document is empty
    #[error("Document is empty")]
    EmptyDocument,

    /// Extraction timeout
    #[error("Extraction timeout")]
    Timeout,

    /// Model answer is not a usable draft
    #[error("Invalid draft format: {0}")]
    InvalidFormat(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::InvalidFormat(e.to_string())
    }
}
