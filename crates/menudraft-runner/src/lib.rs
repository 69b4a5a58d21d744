//! menudraft Job Runner
//!
//! Orchestrates extraction jobs: creates them, runs them through the
//! state machine, and recovers the ones an invocation abandoned.
//!
//! # Run sequence
//!
//! ```text
//! load ──▶ terminal? ──yes──▶ stored outcome
//!            │ no
//!            ▼
//!      rate limit (ocr:<orgId>) ──over──▶ RateLimited (job untouched)
//!            ▼
//!      claim queued → processing ──lost──▶ InProgress
//!            ▼
//!      fetch attachment ─▶ text/*      → heuristic
//!                        ─▶ provider   → AI extractor
//!                        ─▶ otherwise  → placeholder draft
//!            ▼
//!      done + draft   |   failed + message (ExtractionFailed)
//! ```
//!
//! A placeholder draft is a successful outcome. A rate-limit hit is not a
//! job failure.
//!
//! # Example
//!
//! ```
//! use menudraft_domain::{Attachment, AttachmentId, ManualClock, ServiceType};
//! use menudraft_limiter::RateLimiter;
//! use menudraft_llm::MockProvider;
//! use menudraft_runner::{JobRunner, RunnerConfig};
//! use menudraft_store::{InMemoryAttachmentStore, InMemoryJobStore};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let clock = Arc::new(ManualClock::new(0));
//! let attachments = Arc::new(InMemoryAttachmentStore::new());
//! let attachment = Attachment {
//!     id: AttachmentId::new(),
//!     org_id: "org-1".to_string(),
//!     storage_location: "org-1/cena.txt".to_string(),
//!     mime_type: "text/plain".to_string(),
//!     original_name: "cena.txt".to_string(),
//! };
//! attachments.insert(attachment.clone(), "CENA:\nSopa\nPescado");
//!
//! let runner: JobRunner<_, _, MockProvider> = JobRunner::new(
//!     Arc::new(InMemoryJobStore::new()),
//!     attachments,
//!     Arc::new(RateLimiter::new(clock.clone())),
//!     clock,
//!     RunnerConfig::default(),
//! );
//!
//! let job = runner.enqueue(attachment.id).await.unwrap();
//! let result = runner.run(job.job_id).await.unwrap();
//! assert_eq!(result.data.detected_services[0].service_type, ServiceType::Dinner);
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod runner;
mod watchdog;

pub use config::{RunnerConfig, WatchdogConfig, NO_PROVIDER};
pub use error::RunError;
pub use runner::{
    effective_mime_type, parse_attachment_id, parse_job_id, EnqueueResult, JobRunner, RunResult,
};
pub use watchdog::{Watchdog, WatchdogHandle};
