//! Job module - extraction jobs and their lifecycle

use crate::attachment::AttachmentId;
use crate::draft::Draft;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an extraction job (UUIDv7)
///
/// UUIDv7 keeps ids roughly ordered by creation time, which is the order
/// jobs are listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(uuid::Uuid);

impl JobId {
    /// Generate a new JobId
    ///
    /// # Examples
    ///
    /// ```
    /// use menudraft_domain::JobId;
    ///
    /// let id = JobId::new();
    /// assert_eq!(JobId::parse(&id.to_string()).unwrap(), id);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse a JobId from its string form
    pub fn parse(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid job id '{}': {}", s, e))
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a job
///
/// ```text
/// queued ──claim──▶ processing ──▶ done
///    ▲                  │    └───▶ failed
///    └──── requeue ─────┘  (stuck-job watchdog only)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a run request
    Queued,
    /// Claimed by a run invocation
    Processing,
    /// Draft persisted (terminal)
    Done,
    /// Extraction failed, error persisted (terminal)
    Failed,
}

/// Rejected status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    /// Status the job was in
    pub from: JobStatus,
    /// Status that was requested
    pub to: JobStatus,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid job transition {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for InvalidTransition {}

impl JobStatus {
    /// Get the status name as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse a status from its stored name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "done" => Some(JobStatus::Done),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Whether no further transitions are allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    /// Transition table for job status
    pub fn can_transition_to(&self, to: JobStatus) -> bool {
        matches!(
            (self, to),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Done)
                | (JobStatus::Processing, JobStatus::Failed)
                | (JobStatus::Processing, JobStatus::Queued)
        )
    }

    /// Validate a transition, returning the new status
    pub fn transition(self, to: JobStatus) -> Result<JobStatus, InvalidTransition> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid job status: {}", s))
    }
}

/// Fields supplied when a job is enqueued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    /// Organization owning the attachment
    pub org_id: String,
    /// Attachment to extract from
    pub attachment_id: AttachmentId,
    /// Provider configured at enqueue time (e.g. "gemini", "none")
    pub provider: String,
}

/// An extraction job record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Job identifier
    pub id: JobId,
    /// Organization owning the attachment (rate-limit key)
    pub org_id: String,
    /// Attachment being extracted
    pub attachment_id: AttachmentId,
    /// Current lifecycle state
    pub status: JobStatus,
    /// Provider configured when the job was enqueued
    pub provider: String,
    /// Text the draft was derived from, once done
    pub extracted_text: Option<String>,
    /// Persisted draft, once done
    #[serde(rename = "draftJson")]
    pub draft: Option<Draft>,
    /// Failure message, once failed
    pub error: Option<String>,
    /// Creation time (milliseconds since Unix epoch)
    pub created_at: u64,
    /// Last mutation time (milliseconds since Unix epoch)
    pub updated_at: u64,
}

impl Job {
    /// Build a freshly queued job
    pub fn queued(new_job: NewJob, now_ms: u64) -> Self {
        Self {
            id: JobId::new(),
            org_id: new_job.org_id,
            attachment_id: new_job.attachment_id,
            status: JobStatus::Queued,
            provider: new_job.provider,
            extracted_text: None,
            draft: None,
            error: None,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}
