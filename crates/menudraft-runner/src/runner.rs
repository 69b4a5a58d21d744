//! Job runner: enqueue and run extraction jobs

use crate::config::RunnerConfig;
use crate::error::RunError;
use menudraft_domain::traits::{AttachmentRepository, JobRepository, LlmProvider};
use menudraft_domain::{
    build_fallback_draft, Attachment, AttachmentId, Clock, Draft, Job, JobId, JobStatus, NewJob,
};
use menudraft_extractor::{extract_from_text, AiExtractor};
use menudraft_limiter::{LimiterError, RateLimiter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Response to an enqueue request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResult {
    /// The new job's id
    pub job_id: JobId,
}

/// Successful outcome of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Always `done` for a successful run
    pub status: JobStatus,
    /// The persisted draft
    pub data: Draft,
}

/// Parse a caller-supplied job id
pub fn parse_job_id(raw: Option<&str>) -> Result<JobId, RunError> {
    match raw.map(str::trim) {
        None | Some("") => Err(RunError::InvalidArgument("jobId is required".to_string())),
        Some(s) => JobId::parse(s).map_err(RunError::InvalidArgument),
    }
}

/// Parse a caller-supplied attachment id
pub fn parse_attachment_id(raw: Option<&str>) -> Result<AttachmentId, RunError> {
    match raw.map(str::trim) {
        None | Some("") => Err(RunError::InvalidArgument("attachmentId is required".to_string())),
        Some(s) => AttachmentId::parse(s).map_err(RunError::InvalidArgument),
    }
}

/// MIME type to extract with, guessed from the file extension when the
/// stored type is missing or generic
pub fn effective_mime_type(attachment: &Attachment) -> String {
    let stored = attachment.mime_type.trim();
    if !stored.is_empty() && !stored.eq_ignore_ascii_case("application/octet-stream") {
        return stored.to_string();
    }

    let path = attachment.storage_location.to_ascii_lowercase();
    let guessed = if path.ends_with(".pdf") {
        "application/pdf"
    } else if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else if path.ends_with(".txt") || path.ends_with(".md") {
        "text/plain"
    } else {
        "image/jpeg"
    };
    guessed.to_string()
}

fn is_text_mime(mime_type: &str) -> bool {
    mime_type
        .split(';')
        .next()
        .map(|essence| essence.trim().to_ascii_lowercase().starts_with("text/"))
        .unwrap_or(false)
}

/// Drives extraction jobs through `queued → processing → done | failed`
///
/// `run` is idempotent on terminal jobs and safe to call concurrently: the
/// repository's conditional claim lets exactly one caller extract.
pub struct JobRunner<J, A, L>
where
    J: JobRepository,
    A: AttachmentRepository,
    L: LlmProvider,
{
    jobs: Arc<J>,
    attachments: Arc<A>,
    ai_extractor: Option<AiExtractor<L>>,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    config: RunnerConfig,
}

impl<J, A, L> JobRunner<J, A, L>
where
    J: JobRepository,
    A: AttachmentRepository,
    L: LlmProvider + 'static,
{
    /// Create a runner without a generative provider
    ///
    /// Non-text attachments then get the placeholder draft.
    pub fn new(
        jobs: Arc<J>,
        attachments: Arc<A>,
        limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            jobs,
            attachments,
            ai_extractor: None,
            limiter,
            clock,
            config,
        }
    }

    /// Use a generative extractor for non-text attachments
    pub fn with_ai_extractor(mut self, ai_extractor: AiExtractor<L>) -> Self {
        self.ai_extractor = Some(ai_extractor);
        self
    }

    /// Provider name recorded on new jobs
    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    /// Whether a generative extractor is configured
    pub fn has_ai_extractor(&self) -> bool {
        self.ai_extractor.is_some()
    }

    /// The shared rate limiter
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Create a queued job for an attachment
    ///
    /// # Errors
    ///
    /// - `NotFound` if the attachment does not exist
    /// - `Repository` if either repository fails
    pub async fn enqueue(&self, attachment_id: AttachmentId) -> Result<EnqueueResult, RunError> {
        let attachment = self
            .attachments
            .get(attachment_id)
            .await
            .map_err(|e| RunError::Repository(e.to_string()))?
            .ok_or_else(|| RunError::NotFound(format!("attachment {}", attachment_id)))?;

        let new_job = NewJob {
            org_id: attachment.org_id,
            attachment_id,
            provider: self.config.provider.clone(),
        };
        let job = self
            .jobs
            .create(new_job, self.clock.now_millis())
            .await
            .map_err(|e| RunError::Repository(e.to_string()))?;

        info!(
            job_id = %job.id,
            org_id = %job.org_id,
            provider = %job.provider,
            "Enqueued extraction job for attachment {}",
            attachment_id
        );

        Ok(EnqueueResult { job_id: job.id })
    }

    /// Load a job record
    pub async fn get_job(&self, job_id: JobId) -> Result<Job, RunError> {
        self.jobs
            .get(job_id)
            .await
            .map_err(|e| RunError::Repository(e.to_string()))?
            .ok_or_else(|| RunError::NotFound(format!("job {}", job_id)))
    }

    /// Run a job
    ///
    /// Terminal jobs return their stored outcome without extracting again
    /// and without counting against the rate limit. Otherwise the owning
    /// organization is rate-limited before the job is claimed, so a
    /// rejected call leaves the job untouched.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the job does not exist
    /// - `RateLimited` if the organization is over its limit
    /// - `InProgress` if another invocation owns the job
    /// - `ExtractionFailed` if extraction failed now or on an earlier run
    /// - `Repository` if persisting fails
    pub async fn run(&self, job_id: JobId) -> Result<RunResult, RunError> {
        let job = self.get_job(job_id).await?;
        if job.status.is_terminal() {
            debug!(job_id = %job_id, status = %job.status, "Job already finished");
            return stored_outcome(&job);
        }

        match self.limiter.check(&job.org_id, &self.config.rate_limit) {
            Ok(()) => {}
            Err(LimiterError::RateLimitExceeded { retry_after_secs }) => {
                return Err(RunError::RateLimited { retry_after_secs });
            }
            Err(e) => return Err(RunError::Repository(e.to_string())),
        }

        let claimed = self
            .jobs
            .claim(job_id, self.clock.now_millis())
            .await
            .map_err(|e| RunError::Repository(e.to_string()))?;

        if !claimed {
            // another invocation may have finished it since the first read
            let current = self.get_job(job_id).await?;
            if current.status.is_terminal() {
                return stored_outcome(&current);
            }
            debug!(job_id = %job_id, "Job claimed by another invocation");
            return Err(RunError::InProgress(job_id));
        }

        info!(job_id = %job_id, org_id = %job.org_id, "Claimed job");

        match self.extract(&job).await {
            Ok((extracted_text, draft)) => {
                self.jobs
                    .update_result(job_id, extracted_text, draft.clone(), self.clock.now_millis())
                    .await
                    .map_err(|e| RunError::Repository(e.to_string()))?;

                info!(
                    job_id = %job_id,
                    services = draft.detected_services.len(),
                    warnings = draft.warnings.len(),
                    "Job done"
                );
                Ok(RunResult {
                    status: JobStatus::Done,
                    data: draft,
                })
            }
            Err(message) => {
                error!(job_id = %job_id, "Extraction failed: {}", message);
                self.jobs
                    .update_status(
                        job_id,
                        JobStatus::Failed,
                        Some(message.clone()),
                        self.clock.now_millis(),
                    )
                    .await
                    .map_err(|e| RunError::Repository(e.to_string()))?;
                Err(RunError::ExtractionFailed(message))
            }
        }
    }

    /// Fetch the attachment and dispatch to the matching extraction path
    async fn extract(&self, job: &Job) -> Result<(String, Draft), String> {
        let attachment = self
            .attachments
            .get(job.attachment_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("Attachment {} not found", job.attachment_id))?;

        let bytes = self
            .attachments
            .download_bytes(&attachment.storage_location)
            .await
            .map_err(|e| e.to_string())?;

        let mime_type = effective_mime_type(&attachment);

        if is_text_mime(&mime_type) {
            debug!(job_id = %job.id, "Dispatching to heuristic extraction");
            let text = String::from_utf8_lossy(&bytes).into_owned();
            let draft = extract_from_text(&text);
            return Ok((text, draft));
        }

        match &self.ai_extractor {
            Some(ai) => {
                debug!(job_id = %job.id, model = %ai.model_name(), "Dispatching to AI extraction");
                let draft = ai
                    .extract_from_document(&bytes, &mime_type, &attachment.original_name)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok((draft.raw_text.clone(), draft))
            }
            None => {
                warn!(
                    job_id = %job.id,
                    mime_type = %mime_type,
                    "No extraction provider configured, using placeholder draft"
                );
                Ok((String::new(), build_fallback_draft(&attachment.original_name)))
            }
        }
    }
}

fn stored_outcome(job: &Job) -> Result<RunResult, RunError> {
    match job.status {
        JobStatus::Done => job
            .draft
            .clone()
            .map(|data| RunResult {
                status: JobStatus::Done,
                data,
            })
            .ok_or_else(|| RunError::Repository(format!("Job {} is done without a draft", job.id))),
        JobStatus::Failed => Err(RunError::ExtractionFailed(
            job.error.clone().unwrap_or_default(),
        )),
        JobStatus::Queued | JobStatus::Processing => Err(RunError::InProgress(job.id)),
    }
}
