//! menudraft Storage Layer
//!
//! Implements the `JobRepository` and `AttachmentRepository` traits from
//! `menudraft-domain`.
//!
//! # Architecture
//!
//! - SQLite (`ocr_jobs`, `event_attachments`) for job records and
//!   attachment metadata
//! - Attachment bytes on the filesystem under a configured root
//! - In-memory variants of both repositories for tests
//!
//! Job writes go through the state machine: `claim` is a conditional
//! `queued → processing` update, and status/result writes reject
//! transitions the job's current status does not allow.
//!
//! # Examples
//!
//! ```no_run
//! use menudraft_store::{SqliteAttachmentStore, SqliteJobStore};
//!
//! let jobs = SqliteJobStore::new("menudraft.db").unwrap();
//! let attachments = SqliteAttachmentStore::new("menudraft.db", "attachments").unwrap();
//! ```

#![warn(missing_docs)]

mod error;
mod memory;
mod sqlite;

pub use error::StoreError;
pub use memory::{InMemoryAttachmentStore, InMemoryJobStore};
pub use sqlite::{SqliteAttachmentStore, SqliteJobStore};
