//! menudraft Domain Layer
//!
//! Core model for the menu extraction pipeline: the draft a job produces,
//! the job record and its state machine, the attachment metadata a job
//! points at, and the trait seams every infrastructure crate implements.
//!
//! ## Key Concepts
//!
//! - **Draft**: guessed services, sections and line items for an attachment
//! - **Job**: one unit of extraction work (`queued → processing → done | failed`)
//! - **Attachment**: the uploaded document a job extracts from
//! - **Clock**: injected time source so windows and timeouts are testable
//!
//! ## Architecture
//!
//! This crate holds no I/O. Storage, the generative extraction service and
//! the HTTP surface live in other crates and depend on the traits defined in
//! [`traits`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attachment;
pub mod clock;
pub mod draft;
pub mod job;
pub mod traits;

// Re-exports for convenience
pub use attachment::{Attachment, AttachmentId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use draft::{
    build_fallback_draft, fallback_service, Draft, DraftSection, DraftService, ServiceFormat, ServiceType,
    FALLBACK_ITEM, FALLBACK_SECTION_TITLE, FALLBACK_WARNING,
};
pub use job::{InvalidTransition, Job, JobId, JobStatus, NewJob};
