//! Gemini Provider Implementation
//!
//! Integration with Google's Generative Language API (`generateContent`),
//! sending the document inline next to the instruction prompt.
//!
//! # Features
//!
//! - Async HTTP communication via `reqwest`
//! - Configurable endpoint, model and timeout
//! - Retry with exponential backoff on transport errors, 429 and 5xx
//!
//! # Examples
//!
//! ```no_run
//! use menudraft_llm::GeminiProvider;
//!
//! let provider = GeminiProvider::new(
//!     "https://generativelanguage.googleapis.com",
//!     "gemini-2.0-flash-exp",
//!     "api-key",
//! ).unwrap();
//! ```

use crate::LlmError;
use async_trait::async_trait;
use menudraft_domain::traits::{DocumentPart, LlmProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Generative Language API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Default timeout for a single request (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts per call
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Gemini API provider
pub struct GeminiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider with the default timeout
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Self::with_timeout(endpoint, model, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new Gemini provider with an explicit request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("Gemini API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set the maximum number of attempts per call
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }

    fn request_body(prompt: &str, document: &DocumentPart) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: document.mime_type.clone(),
                            data: document.data_base64.clone(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        }
    }

    /// Generate text for a prompt plus an inline document
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The API cannot be reached or times out (after retries)
    /// - The API answers with a non-success status
    /// - The response has no text candidate
    pub async fn generate(&self, prompt: &str, document: &DocumentPart) -> Result<String, LlmError> {
        let url = self.url();
        let request_body = Self::request_body(prompt, document);

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response
                            .json::<GenerateContentResponse>()
                            .await
                            .map_err(|e| {
                                LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                            })?;
                        return body.text().ok_or_else(|| {
                            LlmError::InvalidResponse("Response has no text candidate".to_string())
                        });
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(self.model.clone()));
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(LlmError::RateLimitExceeded);
                    } else if status.is_server_error() {
                        let error_text = response.text().await.unwrap_or_default();
                        last_error = Some(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    } else {
                        let error_text = response.text().await.unwrap_or_default();
                        return Err(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!(attempt = attempts, ?delay, "Gemini request failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    type Error = LlmError;

    async fn generate_with_document(
        &self,
        prompt: &str,
        document: &DocumentPart,
    ) -> Result<String, Self::Error> {
        debug!(
            model = %self.model,
            mime_type = %document.mime_type,
            payload_len = document.data_base64.len(),
            "Calling Gemini generateContent"
        );
        self.generate(prompt, document).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
