//! AI-assisted document extraction

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_llm_response;
use crate::prompt::PromptBuilder;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use menudraft_domain::traits::{DocumentPart, LlmProvider};
use menudraft_domain::{build_fallback_draft, fallback_service, Draft, FALLBACK_WARNING};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Sends documents to a generative model and turns the answer into a draft
pub struct AiExtractor<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    config: ExtractorConfig,
}

impl<L> AiExtractor<L>
where
    L: LlmProvider + 'static,
{
    /// Create a new extractor, validating the configuration
    pub fn new(llm_provider: L, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        Self::from_arc(Arc::new(llm_provider), config)
    }

    /// Create a new extractor around a shared provider
    pub fn from_arc(llm_provider: Arc<L>, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            llm_provider,
            config,
        })
    }

    /// Name of the model behind this extractor
    pub fn model_name(&self) -> &str {
        self.llm_provider.model_name()
    }

    /// Get the extractor configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract a draft from document bytes.
    ///
    /// A response that is not a usable JSON object yields the placeholder
    /// draft for `original_name`. A parsed draft without services gets the
    /// placeholder service appended.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The document is empty or larger than `max_document_bytes`
    /// - The provider call fails or exceeds `extraction_timeout_secs`
    pub async fn extract_from_document(
        &self,
        bytes: &[u8],
        mime_type: &str,
        original_name: &str,
    ) -> Result<Draft, ExtractorError> {
        if bytes.is_empty() {
            return Err(ExtractorError::EmptyDocument);
        }
        if bytes.len() > self.config.max_document_bytes {
            return Err(ExtractorError::DocumentTooLarge(
                bytes.len(),
                self.config.max_document_bytes,
            ));
        }

        info!(
            "Starting AI extraction for '{}' ({}, {} bytes) with model '{}'",
            original_name,
            mime_type,
            bytes.len(),
            self.model_name()
        );

        let prompt = PromptBuilder::new(original_name, mime_type).build();
        let document = DocumentPart {
            mime_type: mime_type.to_string(),
            data_base64: STANDARD.encode(bytes),
        };

        let response = timeout(
            self.config.extraction_timeout(),
            self.llm_provider.generate_with_document(&prompt, &document),
        )
        .await
        .map_err(|_| ExtractorError::Timeout)?
        .map_err(|e| ExtractorError::Llm(e.to_string()))?;

        debug!("LLM response length: {} chars", response.len());

        let mut draft = match parse_llm_response(&response, self.config.raw_text_excerpt_chars) {
            Ok(draft) => draft,
            Err(e) => {
                warn!("Unusable model response for '{}', using placeholder: {}", original_name, e);
                return Ok(build_fallback_draft(original_name));
            }
        };

        if !draft.has_services() {
            warn!("Model found no services in '{}', adding placeholder", original_name);
            draft.detected_services.push(fallback_service(original_name));
            draft.warnings.push(FALLBACK_WARNING.to_string());
        }

        info!(
            "AI extraction complete: {} services",
            draft.detected_services.len()
        );

        Ok(draft)
    }
}
