//! In-memory repositories for tests and single-process setups

use crate::error::StoreError;
use async_trait::async_trait;
use menudraft_domain::traits::{AttachmentRepository, JobRepository};
use menudraft_domain::{Attachment, AttachmentId, Draft, Job, JobId, JobStatus, NewJob};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Job repository held in a map behind one mutex
///
/// Every operation runs under the lock, so `claim` is atomic.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a job record as-is
    pub fn insert(&self, job: Job) {
        lock(&self.jobs).insert(job.id, job);
    }

    /// Number of stored jobs
    pub fn len(&self) -> usize {
        lock(&self.jobs).len()
    }

    /// Whether the store holds no jobs
    pub fn is_empty(&self) -> bool {
        lock(&self.jobs).is_empty()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobStore {
    type Error = StoreError;

    async fn create(&self, new_job: NewJob, now_ms: u64) -> Result<Job, Self::Error> {
        let job = Job::queued(new_job, now_ms);
        lock(&self.jobs).insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>, Self::Error> {
        Ok(lock(&self.jobs).get(&id).cloned())
    }

    async fn claim(&self, id: JobId, now_ms: u64) -> Result<bool, Self::Error> {
        let mut jobs = lock(&self.jobs);
        match jobs.get_mut(&id) {
            Some(job) if job.status == JobStatus::Queued => {
                job.status = JobStatus::Processing;
                job.updated_at = now_ms;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_status(
        &self,
        id: JobId,
        status: JobStatus,
        error: Option<String>,
        now_ms: u64,
    ) -> Result<(), Self::Error> {
        let mut jobs = lock(&self.jobs);
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("job {}", id)))?;

        job.status = job.status.transition(status)?;
        job.error = error;
        job.updated_at = now_ms;
        Ok(())
    }

    async fn update_result(
        &self,
        id: JobId,
        extracted_text: String,
        draft: Draft,
        now_ms: u64,
    ) -> Result<(), Self::Error> {
        let mut jobs = lock(&self.jobs);
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("job {}", id)))?;

        job.status = job.status.transition(JobStatus::Done)?;
        job.extracted_text = Some(extracted_text);
        job.draft = Some(draft);
        job.error = None;
        job.updated_at = now_ms;
        Ok(())
    }

    async fn requeue_stuck(&self, cutoff_ms: u64, now_ms: u64) -> Result<Vec<JobId>, Self::Error> {
        let mut jobs = lock(&self.jobs);
        let mut requeued = Vec::new();
        for job in jobs.values_mut() {
            if job.status == JobStatus::Processing && job.updated_at < cutoff_ms {
                job.status = JobStatus::Queued;
                job.updated_at = now_ms;
                requeued.push(job.id);
            }
        }
        requeued.sort();
        Ok(requeued)
    }
}

/// Attachment repository with metadata and bytes held in memory
#[derive(Debug, Default)]
pub struct InMemoryAttachmentStore {
    attachments: Mutex<HashMap<AttachmentId, Attachment>>,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryAttachmentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attachment and its bytes
    pub fn insert(&self, attachment: Attachment, bytes: impl Into<Vec<u8>>) {
        lock(&self.blobs).insert(attachment.storage_location.clone(), bytes.into());
        lock(&self.attachments).insert(attachment.id, attachment);
    }

    /// Drop the bytes behind a storage location, keeping the metadata
    pub fn remove_bytes(&self, storage_location: &str) {
        lock(&self.blobs).remove(storage_location);
    }
}

#[async_trait]
impl AttachmentRepository for InMemoryAttachmentStore {
    type Error = StoreError;

    async fn get(&self, id: AttachmentId) -> Result<Option<Attachment>, Self::Error> {
        Ok(lock(&self.attachments).get(&id).cloned())
    }

    async fn download_bytes(&self, storage_location: &str) -> Result<Vec<u8>, Self::Error> {
        lock(&self.blobs)
            .get(storage_location)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("attachment bytes at {}", storage_location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job() -> NewJob {
        NewJob {
            org_id: "org-1".to_string(),
            attachment_id: AttachmentId::new(),
            provider: "heuristic".to_string(),
        }
    }

    #[tokio::test]
    async fn test_claim_only_once() {
        let store = InMemoryJobStore::new();
        let job = store.create(new_job(), 10).await.unwrap();

        assert!(store.claim(job.id, 20).await.unwrap());
        assert!(!store.claim(job.id, 30).await.unwrap());

        let stored = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Processing);
        assert_eq!(stored.updated_at, 20);
    }

    #[tokio::test]
    async fn test_claim_unknown_job() {
        let store = InMemoryJobStore::new();
        assert!(!store.claim(JobId::new(), 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_status_validates_transition() {
        let store = InMemoryJobStore::new();
        let job = store.create(new_job(), 0).await.unwrap();

        let result = store
            .update_status(job.id, JobStatus::Done, None, 1)
            .await;
        assert!(matches!(result, Err(StoreError::InvalidTransition(_))));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_download_missing_bytes() {
        let store = InMemoryAttachmentStore::new();
        let result = store.download_bytes("nowhere").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
