//! menudraft LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `menudraft-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `GeminiProvider`: Google Generative Language API with inline documents
//!
//! # Examples
//!
//! ```
//! use menudraft_llm::MockProvider;
//! use menudraft_domain::traits::{DocumentPart, LlmProvider};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = MockProvider::new(r#"{"rawText": "", "warnings": [], "detectedServices": []}"#);
//! let document = DocumentPart {
//!     mime_type: "image/png".to_string(),
//!     data_base64: "aGVsbG8=".to_string(),
//! };
//! let result = provider.generate_with_document("prompt", &document).await.unwrap();
//! assert!(result.starts_with('{'));
//! # }
//! ```

#![warn(missing_docs)]

pub mod gemini;

use async_trait::async_trait;
use menudraft_domain::traits::{DocumentPart, LlmProvider};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub use gemini::GeminiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded on the provider side
    #[error("Provider rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider misconfigured (missing key, bad endpoint)
    #[error("Provider configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Mock LLM provider for deterministic testing
///
/// Returns scripted responses without any network calls. Scripted
/// responses and errors are consumed in order; once exhausted the default
/// response is returned.
///
/// # Examples
///
/// ```
/// use menudraft_llm::MockProvider;
///
/// let provider = MockProvider::new("default");
/// provider.push_response("first");
/// provider.push_error("service unavailable");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    scripted: Arc<Mutex<VecDeque<Result<String, String>>>>,
    call_count: Arc<Mutex<usize>>,
    last_document: Arc<Mutex<Option<DocumentPart>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all calls
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
            last_document: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue a response for the next unscripted call
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.scripted).push_back(Ok(response.into()));
    }

    /// Queue a transport-style failure for the next unscripted call
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.scripted).push_back(Err(message.into()));
    }

    /// Get the number of times the provider was called
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
    }

    /// The document sent with the most recent call
    pub fn last_document(&self) -> Option<DocumentPart> {
        lock(&self.last_document).clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    type Error = LlmError;

    async fn generate_with_document(
        &self,
        _prompt: &str,
        document: &DocumentPart,
    ) -> Result<String, Self::Error> {
        *lock(&self.call_count) += 1;
        *lock(&self.last_document) = Some(document.clone());

        match lock(&self.scripted).pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(LlmError::Communication(message)),
            None => Ok(self.default_response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> DocumentPart {
        DocumentPart {
            mime_type: "application/pdf".to_string(),
            data_base64: "JVBERi0=".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate_with_document("any prompt", &document()).await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_scripted_responses_in_order() {
        let provider = MockProvider::default();
        provider.push_response("first");
        provider.push_response("second");

        assert_eq!(provider.generate_with_document("p", &document()).await.unwrap(), "first");
        assert_eq!(provider.generate_with_document("p", &document()).await.unwrap(), "second");
        assert_eq!(
            provider.generate_with_document("p", &document()).await.unwrap(),
            "Default mock response"
        );
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.generate_with_document("p1", &document()).await.unwrap();
        assert_eq!(provider.call_count(), 1);

        provider.generate_with_document("p2", &document()).await.unwrap();
        assert_eq!(provider.call_count(), 2);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockProvider::default();
        provider.push_error("timeout");

        let result = provider.generate_with_document("p", &document()).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }

    #[tokio::test]
    async fn test_mock_provider_records_document() {
        let provider = MockProvider::new("ok");
        assert!(provider.last_document().is_none());

        provider.generate_with_document("p", &document()).await.unwrap();
        assert_eq!(provider.last_document(), Some(document()));
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate_with_document("p", &document()).await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }
}
