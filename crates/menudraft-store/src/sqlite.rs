//! SQLite-backed repositories

use crate::error::StoreError;
use async_trait::async_trait;
use menudraft_domain::traits::{AttachmentRepository, JobRepository};
use menudraft_domain::{Attachment, AttachmentId, Draft, Job, JobId, JobStatus, NewJob};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

const SCHEMA: &str = include_str!("schema.sql");

const JOB_COLUMNS: &str = "id, org_id, attachment_id, status, provider, extracted_text, draft_json, error, created_at, updated_at";

fn open(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

fn conversion_error(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn row_to_job(row: &Row<'_>) -> rusqlite::Result<Job> {
    let id: String = row.get(0)?;
    let attachment_id: String = row.get(2)?;
    let status: String = row.get(3)?;
    let draft_json: Option<String> = row.get(6)?;

    let id = JobId::parse(&id).map_err(|e| conversion_error(0, StoreError::InvalidData(e)))?;
    let attachment_id = AttachmentId::parse(&attachment_id)
        .map_err(|e| conversion_error(2, StoreError::InvalidData(e)))?;
    let status = JobStatus::parse(&status).ok_or_else(|| {
        conversion_error(3, StoreError::InvalidData(format!("Unknown job status: {}", status)))
    })?;
    let draft = draft_json
        .map(|json| serde_json::from_str::<Draft>(&json))
        .transpose()
        .map_err(|e| conversion_error(6, e))?;

    Ok(Job {
        id,
        org_id: row.get(1)?,
        attachment_id,
        status,
        provider: row.get(4)?,
        extracted_text: row.get(5)?,
        draft,
        error: row.get(7)?,
        created_at: row.get::<_, i64>(8)? as u64,
        updated_at: row.get::<_, i64>(9)? as u64,
    })
}

fn current_status(conn: &Connection, id: JobId) -> Result<JobStatus, StoreError> {
    let status: Option<String> = conn
        .query_row(
            "SELECT status FROM ocr_jobs WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    let status = status.ok_or_else(|| StoreError::NotFound(format!("job {}", id)))?;
    JobStatus::parse(&status)
        .ok_or_else(|| StoreError::InvalidData(format!("Unknown job status: {}", status)))
}

/// SQLite implementation of [`JobRepository`]
///
/// Writes that move a job validate the transition against the status read
/// in the same transaction. `claim` and `requeue_stuck` are single
/// conditional `UPDATE` statements.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Open (or create) the job store at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use menudraft_store::SqliteJobStore;
    ///
    /// let store = SqliteJobStore::new("menudraft.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Ok(Self {
            conn: Mutex::new(open(path.as_ref())?),
        })
    }

    /// Count jobs per status (for health reporting)
    pub fn count_by_status(&self, status: JobStatus) -> Result<usize, StoreError> {
        let count: i64 = lock(&self.conn).query_row(
            "SELECT COUNT(*) FROM ocr_jobs WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[async_trait]
impl JobRepository for SqliteJobStore {
    type Error = StoreError;

    async fn create(&self, new_job: NewJob, now_ms: u64) -> Result<Job, Self::Error> {
        let job = Job::queued(new_job, now_ms);

        lock(&self.conn).execute(
            "INSERT INTO ocr_jobs (id, org_id, attachment_id, status, provider, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                job.id.to_string(),
                &job.org_id,
                job.attachment_id.to_string(),
                job.status.as_str(),
                &job.provider,
                job.created_at as i64,
                job.updated_at as i64,
            ],
        )?;

        debug!("Inserted job {}", job.id);
        Ok(job)
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>, Self::Error> {
        let job = lock(&self.conn)
            .query_row(
                &format!("SELECT {} FROM ocr_jobs WHERE id = ?1", JOB_COLUMNS),
                params![id.to_string()],
                row_to_job,
            )
            .optional()?;
        Ok(job)
    }

    async fn claim(&self, id: JobId, now_ms: u64) -> Result<bool, Self::Error> {
        let changed = lock(&self.conn).execute(
            "UPDATE ocr_jobs SET status = 'processing', updated_at = ?2
             WHERE id = ?1 AND status = 'queued'",
            params![id.to_string(), now_ms as i64],
        )?;
        Ok(changed == 1)
    }

    async fn update_status(
        &self,
        id: JobId,
        status: JobStatus,
        error: Option<String>,
        now_ms: u64,
    ) -> Result<(), Self::Error> {
        let mut conn = lock(&self.conn);
        let tx = conn.transaction()?;

        let from = current_status(&tx, id)?;
        from.transition(status)?;

        tx.execute(
            "UPDATE ocr_jobs SET status = ?2, error = ?3, updated_at = ?4
             WHERE id = ?1 AND status = ?5",
            params![
                id.to_string(),
                status.as_str(),
                error,
                now_ms as i64,
                from.as_str(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    async fn update_result(
        &self,
        id: JobId,
        extracted_text: String,
        draft: Draft,
        now_ms: u64,
    ) -> Result<(), Self::Error> {
        let draft_json = serde_json::to_string(&draft)
            .map_err(|e| StoreError::InvalidData(format!("Failed to encode draft: {}", e)))?;

        let mut conn = lock(&self.conn);
        let tx = conn.transaction()?;

        let from = current_status(&tx, id)?;
        from.transition(JobStatus::Done)?;

        tx.execute(
            "UPDATE ocr_jobs
             SET status = 'done', extracted_text = ?2, draft_json = ?3, error = NULL, updated_at = ?4
             WHERE id = ?1 AND status = ?5",
            params![id.to_string(), extracted_text, draft_json, now_ms as i64, from.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    async fn requeue_stuck(&self, cutoff_ms: u64, now_ms: u64) -> Result<Vec<JobId>, Self::Error> {
        let conn = lock(&self.conn);
        let mut stmt = conn.prepare(
            "UPDATE ocr_jobs SET status = 'queued', updated_at = ?2
             WHERE status = 'processing' AND updated_at < ?1
             RETURNING id",
        )?;

        let ids = stmt
            .query_map(params![cutoff_ms as i64, now_ms as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        ids.into_iter()
            .map(|id| JobId::parse(&id).map_err(StoreError::InvalidData))
            .collect()
    }
}

/// SQLite metadata plus filesystem bytes, implementing [`AttachmentRepository`]
///
/// `storage_location` is a relative path under the attachments root;
/// absolute paths and `..` segments are rejected.
pub struct SqliteAttachmentStore {
    conn: Mutex<Connection>,
    root: PathBuf,
}

impl SqliteAttachmentStore {
    /// Open (or create) the attachment store at `path`, reading bytes from `root`
    pub fn new<P: AsRef<Path>>(path: P, root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            conn: Mutex::new(open(path.as_ref())?),
            root: root.into(),
        })
    }

    /// Register attachment metadata
    pub fn insert(&self, attachment: &Attachment) -> Result<(), StoreError> {
        lock(&self.conn).execute(
            "INSERT INTO event_attachments (id, org_id, storage_location, mime_type, original_name)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                attachment.id.to_string(),
                &attachment.org_id,
                &attachment.storage_location,
                &attachment.mime_type,
                &attachment.original_name,
            ],
        )?;
        Ok(())
    }

    /// Attachments root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, storage_location: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(storage_location);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

        if storage_location.trim().is_empty() || escapes {
            return Err(StoreError::InvalidLocation(storage_location.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AttachmentRepository for SqliteAttachmentStore {
    type Error = StoreError;

    async fn get(&self, id: AttachmentId) -> Result<Option<Attachment>, Self::Error> {
        let attachment = lock(&self.conn)
            .query_row(
                "SELECT id, org_id, storage_location, mime_type, original_name
                 FROM event_attachments WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    let id: String = row.get(0)?;
                    let id = AttachmentId::parse(&id)
                        .map_err(|e| conversion_error(0, StoreError::InvalidData(e)))?;
                    Ok(Attachment {
                        id,
                        org_id: row.get(1)?,
                        storage_location: row.get(2)?,
                        mime_type: row.get(3)?,
                        original_name: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(attachment)
    }

    async fn download_bytes(&self, storage_location: &str) -> Result<Vec<u8>, Self::Error> {
        let path = self.resolve(storage_location)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(
                format!("attachment bytes at {}", storage_location),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteAttachmentStore {
        SqliteAttachmentStore::new(":memory:", "/srv/attachments").unwrap()
    }

    #[test]
    fn test_resolve_relative_location() {
        let path = store().resolve("org-1/menu.pdf").unwrap();
        assert_eq!(path, PathBuf::from("/srv/attachments/org-1/menu.pdf"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = store();
        assert!(matches!(store.resolve("../etc/passwd"), Err(StoreError::InvalidLocation(_))));
        assert!(matches!(store.resolve("org/../../x"), Err(StoreError::InvalidLocation(_))));
        assert!(matches!(store.resolve("/etc/passwd"), Err(StoreError::InvalidLocation(_))));
        assert!(matches!(store.resolve(""), Err(StoreError::InvalidLocation(_))));
    }
}
