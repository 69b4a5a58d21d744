//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction pipeline and
//! its collaborators. Implementations live in other crates.

use crate::{Attachment, AttachmentId, Draft, Job, JobId, JobStatus, NewJob};
use async_trait::async_trait;

/// Persistence for extraction jobs
///
/// Implemented by the infrastructure layer (menudraft-store)
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Error type for repository operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert a new queued job
    async fn create(&self, new_job: NewJob, now_ms: u64) -> Result<Job, Self::Error>;

    /// Get a job by ID
    async fn get(&self, id: JobId) -> Result<Option<Job>, Self::Error>;

    /// Atomically move a job from `queued` to `processing`.
    ///
    /// Returns `false` when the job is not currently queued, so that only
    /// one of several concurrent callers proceeds.
    async fn claim(&self, id: JobId, now_ms: u64) -> Result<bool, Self::Error>;

    /// Change a job's status (and error message), validating the transition
    async fn update_status(
        &self,
        id: JobId,
        status: JobStatus,
        error: Option<String>,
        now_ms: u64,
    ) -> Result<(), Self::Error>;

    /// Persist a finished draft and move the job to `done`
    async fn update_result(
        &self,
        id: JobId,
        extracted_text: String,
        draft: Draft,
        now_ms: u64,
    ) -> Result<(), Self::Error>;

    /// Move every job stuck in `processing` since before `cutoff_ms` back to
    /// `queued`, returning the requeued ids
    async fn requeue_stuck(&self, cutoff_ms: u64, now_ms: u64) -> Result<Vec<JobId>, Self::Error>;
}

/// Read access to uploaded attachments
///
/// Implemented by the infrastructure layer (menudraft-store)
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Error type for attachment operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Get attachment metadata by ID
    async fn get(&self, id: AttachmentId) -> Result<Option<Attachment>, Self::Error>;

    /// Download the attachment content
    async fn download_bytes(&self, storage_location: &str) -> Result<Vec<u8>, Self::Error>;
}

/// Inline document sent to a generative model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPart {
    /// MIME type of the document
    pub mime_type: String,
    /// Base64-encoded document content
    pub data_base64: String,
}

/// Generative extraction service
///
/// Implemented by the infrastructure layer (menudraft-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Generate a completion for a prompt with an attached document
    async fn generate_with_document(
        &self,
        prompt: &str,
        document: &DocumentPart,
    ) -> Result<String, Self::Error>;

    /// Name of the model answering requests
    fn model_name(&self) -> &str;
}
