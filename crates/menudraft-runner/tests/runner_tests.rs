//! Job lifecycle tests against in-memory repositories

use async_trait::async_trait;
use menudraft_domain::traits::JobRepository;
use menudraft_domain::{
    Attachment, AttachmentId, Draft, Job, JobId, JobStatus, ManualClock, NewJob, ServiceFormat,
    ServiceType, FALLBACK_WARNING,
};
use menudraft_extractor::{AiExtractor, ExtractorConfig};
use menudraft_limiter::{RateLimitConfig, RateLimiter};
use menudraft_llm::MockProvider;
use menudraft_runner::{JobRunner, RunError, RunnerConfig, Watchdog, WatchdogConfig};
use menudraft_store::{InMemoryAttachmentStore, InMemoryJobStore, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const AI_RESPONSE: &str = r#"{
    "rawText": "COCTEL 19:30 150 invitados",
    "warnings": [],
    "detectedServices": [{
        "serviceType": "cocktail",
        "startsAtGuess": "19:30",
        "paxGuess": 150,
        "formatGuess": "standing",
        "sections": [{"title": "Frios", "items": ["Gazpacho", "Jamon"]}]
    }]
}"#;

struct Harness {
    runner: JobRunner<InMemoryJobStore, InMemoryAttachmentStore, MockProvider>,
    jobs: Arc<InMemoryJobStore>,
    attachments: Arc<InMemoryAttachmentStore>,
    llm: MockProvider,
    clock: ManualClock,
}

impl Harness {
    fn new(with_ai: bool, limit: u32) -> Self {
        let clock = ManualClock::new(1_700_000_000_000);
        let jobs = Arc::new(InMemoryJobStore::new());
        let attachments = Arc::new(InMemoryAttachmentStore::new());
        let llm = MockProvider::new(AI_RESPONSE);
        let limiter = Arc::new(RateLimiter::new(Arc::new(clock.clone())));

        let config = RunnerConfig {
            provider: if with_ai { "gemini" } else { "none" }.to_string(),
            rate_limit: RateLimitConfig {
                limit,
                ..Default::default()
            },
        };

        let mut runner = JobRunner::new(
            jobs.clone(),
            attachments.clone(),
            limiter,
            Arc::new(clock.clone()),
            config,
        );
        if with_ai {
            let extractor = AiExtractor::new(llm.clone(), ExtractorConfig::default()).unwrap();
            runner = runner.with_ai_extractor(extractor);
        }

        Self {
            runner,
            jobs,
            attachments,
            llm,
            clock,
        }
    }

    fn add_attachment(&self, org_id: &str, name: &str, mime_type: &str, bytes: &[u8]) -> AttachmentId {
        let attachment = Attachment {
            id: AttachmentId::new(),
            org_id: org_id.to_string(),
            storage_location: format!("{}/{}", org_id, name),
            mime_type: mime_type.to_string(),
            original_name: name.to_string(),
        };
        let id = attachment.id;
        self.attachments.insert(attachment, bytes.to_vec());
        id
    }

    async fn job(&self, id: menudraft_domain::JobId) -> Job {
        self.jobs.get(id).await.unwrap().unwrap()
    }
}

#[tokio::test]
async fn test_text_attachment_end_to_end() {
    let h = Harness::new(true, 20);
    let attachment = h.add_attachment("org-1", "cena.txt", "text/plain", b"CENA:\nSopa\nPescado");

    let enqueued = h.runner.enqueue(attachment).await.unwrap();
    let queued = h.job(enqueued.job_id).await;
    assert_eq!(queued.status, JobStatus::Queued);
    assert_eq!(queued.org_id, "org-1");
    assert_eq!(queued.provider, "gemini");

    let result = h.runner.run(enqueued.job_id).await.unwrap();
    assert_eq!(result.status, JobStatus::Done);

    let service = &result.data.detected_services[0];
    assert_eq!(service.service_type, ServiceType::Dinner);
    assert_eq!(service.sections.len(), 1);
    assert_eq!(service.sections[0].title, "CENA");
    assert_eq!(service.sections[0].items, vec!["Sopa", "Pescado"]);

    // text never reaches the model, even when one is configured
    assert_eq!(h.llm.call_count(), 0);

    let stored = h.job(enqueued.job_id).await;
    assert_eq!(stored.status, JobStatus::Done);
    assert_eq!(stored.extracted_text.as_deref(), Some("CENA:\nSopa\nPescado"));
    assert_eq!(stored.draft, Some(result.data));
}

#[tokio::test]
async fn test_ai_extraction() {
    let h = Harness::new(true, 20);
    let attachment = h.add_attachment("org-1", "coctel.png", "image/png", b"\x89PNG");

    let job_id = h.runner.enqueue(attachment).await.unwrap().job_id;
    let result = h.runner.run(job_id).await.unwrap();

    let service = &result.data.detected_services[0];
    assert_eq!(service.service_type, ServiceType::Cocktail);
    assert_eq!(service.pax_guess, Some(150));
    assert_eq!(service.format_guess, ServiceFormat::Standing);
    assert_eq!(h.llm.call_count(), 1);
    assert_eq!(h.llm.last_document().unwrap().mime_type, "image/png");

    let stored = h.job(job_id).await;
    assert_eq!(stored.extracted_text.as_deref(), Some("COCTEL 19:30 150 invitados"));
}

#[tokio::test]
async fn test_run_twice_extracts_once() {
    let h = Harness::new(true, 20);
    let attachment = h.add_attachment("org-1", "menu.pdf", "application/pdf", b"%PDF");
    let job_id = h.runner.enqueue(attachment).await.unwrap().job_id;

    let first = h.runner.run(job_id).await.unwrap();
    let second = h.runner.run(job_id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.llm.call_count(), 1);
}

#[tokio::test]
async fn test_rate_limited_run_leaves_job_queued() {
    let h = Harness::new(false, 1);
    let first = h.add_attachment("org-1", "a.txt", "text/plain", b"COMIDA:\nArroz");
    let second = h.add_attachment("org-1", "b.txt", "text/plain", b"CENA:\nSopa");

    let first_job = h.runner.enqueue(first).await.unwrap().job_id;
    let second_job = h.runner.enqueue(second).await.unwrap().job_id;

    h.runner.run(first_job).await.unwrap();

    match h.runner.run(second_job).await {
        Err(RunError::RateLimited { retry_after_secs }) => assert!(retry_after_secs <= 60),
        other => panic!("Expected RateLimited, got {:?}", other),
    }
    let job = h.job(second_job).await;
    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.error.is_none());

    // a new window lets the job through
    h.clock.advance(Duration::from_secs(61));
    assert!(h.runner.run(second_job).await.is_ok());
}

#[tokio::test]
async fn test_terminal_run_skips_rate_limit() {
    let h = Harness::new(false, 1);
    let attachment = h.add_attachment("org-1", "a.txt", "text/plain", b"Pan");
    let job_id = h.runner.enqueue(attachment).await.unwrap().job_id;

    h.runner.run(job_id).await.unwrap();
    for _ in 0..3 {
        assert!(h.runner.run(job_id).await.is_ok());
    }
}

#[tokio::test]
async fn test_other_orgs_not_limited() {
    let h = Harness::new(false, 1);
    let a = h.add_attachment("org-a", "a.txt", "text/plain", b"Pan");
    let b = h.add_attachment("org-b", "b.txt", "text/plain", b"Pan");

    let job_a = h.runner.enqueue(a).await.unwrap().job_id;
    let job_b = h.runner.enqueue(b).await.unwrap().job_id;

    assert!(h.runner.run(job_a).await.is_ok());
    assert!(h.runner.run(job_b).await.is_ok());
}

#[tokio::test]
async fn test_unparseable_ai_output_is_degraded_success() {
    let h = Harness::new(true, 20);
    h.llm.push_response("Lo siento, no puedo leer la imagen");
    let attachment = h.add_attachment("org-1", "borroso.jpg", "image/jpeg", b"jpeg");
    let job_id = h.runner.enqueue(attachment).await.unwrap().job_id;

    let result = h.runner.run(job_id).await.unwrap();
    assert_eq!(result.status, JobStatus::Done);
    assert_eq!(result.data.warnings, vec![FALLBACK_WARNING.to_string()]);
    assert_eq!(result.data.detected_services[0].service_type, ServiceType::Other);
    assert_eq!(
        result.data.detected_services[0].sections[0].items,
        vec!["borroso.jpg"]
    );
    assert_eq!(h.job(job_id).await.status, JobStatus::Done);
}

#[tokio::test]
async fn test_transport_error_fails_job() {
    let h = Harness::new(true, 20);
    h.llm.push_error("503 service unavailable");
    let attachment = h.add_attachment("org-1", "menu.pdf", "application/pdf", b"%PDF");
    let job_id = h.runner.enqueue(attachment).await.unwrap().job_id;

    let error = match h.runner.run(job_id).await {
        Err(RunError::ExtractionFailed(message)) => message,
        other => panic!("Expected ExtractionFailed, got {:?}", other),
    };
    assert!(error.contains("503 service unavailable"));

    let stored = h.job(job_id).await;
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.error.as_deref(), Some(error.as_str()));

    // failed is terminal: same outcome, no new call
    assert_eq!(
        h.runner.run(job_id).await,
        Err(RunError::ExtractionFailed(error))
    );
    assert_eq!(h.llm.call_count(), 1);
}

#[tokio::test]
async fn test_no_provider_uses_placeholder() {
    let h = Harness::new(false, 20);
    let attachment = h.add_attachment("org-1", "carta.png", "image/png", b"png");
    let job_id = h.runner.enqueue(attachment).await.unwrap().job_id;

    assert_eq!(h.job(job_id).await.provider, "none");

    let result = h.runner.run(job_id).await.unwrap();
    assert_eq!(result.data.raw_text, "");
    assert_eq!(result.data.detected_services[0].sections[0].title, "OCR");
    assert_eq!(result.data.detected_services[0].sections[0].items, vec!["carta.png"]);
    assert_eq!(h.llm.call_count(), 0);
}

#[tokio::test]
async fn test_missing_bytes_fail_job() {
    let h = Harness::new(false, 20);
    let attachment = h.add_attachment("org-1", "gone.txt", "text/plain", b"x");
    h.attachments.remove_bytes("org-1/gone.txt");
    let job_id = h.runner.enqueue(attachment).await.unwrap().job_id;

    assert!(matches!(
        h.runner.run(job_id).await,
        Err(RunError::ExtractionFailed(_))
    ));
    assert_eq!(h.job(job_id).await.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_not_found() {
    let h = Harness::new(false, 20);

    assert!(matches!(
        h.runner.enqueue(AttachmentId::new()).await,
        Err(RunError::NotFound(_))
    ));
    assert!(h.jobs.is_empty());

    assert!(matches!(
        h.runner.run(menudraft_domain::JobId::new()).await,
        Err(RunError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_claimed_job_reports_in_progress() {
    let h = Harness::new(true, 20);
    let attachment = h.add_attachment("org-1", "menu.pdf", "application/pdf", b"%PDF");
    let job_id = h.runner.enqueue(attachment).await.unwrap().job_id;

    assert!(h.jobs.claim(job_id, h.clock_now()).await.unwrap());

    assert_eq!(h.runner.run(job_id).await, Err(RunError::InProgress(job_id)));
    assert_eq!(h.llm.call_count(), 0);
    assert_eq!(h.job(job_id).await.status, JobStatus::Processing);
}

/// Job store that yields before every read and claim, so concurrent runs
/// interleave at each repository call
struct YieldingJobStore {
    inner: InMemoryJobStore,
    claims_won: AtomicUsize,
}

#[async_trait]
impl JobRepository for YieldingJobStore {
    type Error = StoreError;

    async fn create(&self, new_job: NewJob, now_ms: u64) -> Result<Job, StoreError> {
        self.inner.create(new_job, now_ms).await
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.get(id).await
    }

    async fn claim(&self, id: JobId, now_ms: u64) -> Result<bool, StoreError> {
        tokio::task::yield_now().await;
        let claimed = self.inner.claim(id, now_ms).await?;
        if claimed {
            self.claims_won.fetch_add(1, Ordering::SeqCst);
        }
        Ok(claimed)
    }

    async fn update_status(
        &self,
        id: JobId,
        status: JobStatus,
        error: Option<String>,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        self.inner.update_status(id, status, error, now_ms).await
    }

    async fn update_result(
        &self,
        id: JobId,
        extracted_text: String,
        draft: Draft,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        self.inner.update_result(id, extracted_text, draft, now_ms).await
    }

    async fn requeue_stuck(&self, cutoff_ms: u64, now_ms: u64) -> Result<Vec<JobId>, StoreError> {
        self.inner.requeue_stuck(cutoff_ms, now_ms).await
    }
}

#[tokio::test]
async fn test_concurrent_runs_extract_once() {
    let clock = ManualClock::new(1_700_000_000_000);
    let jobs = Arc::new(YieldingJobStore {
        inner: InMemoryJobStore::new(),
        claims_won: AtomicUsize::new(0),
    });
    let attachments = Arc::new(InMemoryAttachmentStore::new());
    let llm = MockProvider::new(AI_RESPONSE);

    let runner = JobRunner::new(
        jobs.clone(),
        attachments.clone(),
        Arc::new(RateLimiter::new(Arc::new(clock.clone()))),
        Arc::new(clock.clone()),
        RunnerConfig::default(),
    )
    .with_ai_extractor(AiExtractor::new(llm.clone(), ExtractorConfig::default()).unwrap());

    let attachment = Attachment {
        id: AttachmentId::new(),
        org_id: "org-1".to_string(),
        storage_location: "org-1/menu.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        original_name: "menu.pdf".to_string(),
    };
    let attachment_id = attachment.id;
    attachments.insert(attachment, b"%PDF".to_vec());
    let job_id = runner.enqueue(attachment_id).await.unwrap().job_id;

    let (a, b) = tokio::join!(runner.run(job_id), runner.run(job_id));

    // both passed the terminal check before either claimed
    assert_eq!(jobs.claims_won.load(Ordering::SeqCst), 1);
    assert_eq!(llm.call_count(), 1);

    // the losing run re-reads the finished job and returns its draft
    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.data.detected_services[0].service_type, ServiceType::Cocktail);
}

#[tokio::test]
async fn test_watchdog_requeues_abandoned_job() {
    let h = Harness::new(false, 20);
    let attachment = h.add_attachment("org-1", "a.txt", "text/plain", b"CENA:\nSopa");
    let job_id = h.runner.enqueue(attachment).await.unwrap().job_id;

    // an invocation claims the job and dies
    h.jobs.claim(job_id, h.clock_now()).await.unwrap();

    let watchdog = Watchdog::new(
        h.jobs.clone(),
        Arc::new(h.clock.clone()),
        WatchdogConfig::default(),
    );

    h.clock.advance(Duration::from_secs(60));
    assert!(watchdog.check_once().await.unwrap().is_empty());

    h.clock.advance(Duration::from_secs(900));
    assert_eq!(watchdog.check_once().await.unwrap(), vec![job_id]);
    assert_eq!(watchdog.requeued_total(), 1);
    assert_eq!(h.job(job_id).await.status, JobStatus::Queued);

    let result = h.runner.run(job_id).await.unwrap();
    assert_eq!(result.data.detected_services[0].service_type, ServiceType::Dinner);
}

#[tokio::test]
async fn test_watchdog_background_loop() {
    let h = Harness::new(false, 20);
    let attachment = h.add_attachment("org-1", "a.txt", "text/plain", b"x");
    let job_id = h.runner.enqueue(attachment).await.unwrap().job_id;
    h.jobs.claim(job_id, h.clock_now()).await.unwrap();
    h.clock.advance(Duration::from_secs(1_000));

    let watchdog = Arc::new(Watchdog::new(
        h.jobs.clone(),
        Arc::new(h.clock.clone()),
        WatchdogConfig {
            interval_secs: 1,
            ..Default::default()
        },
    ));
    let handle = watchdog.clone().start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.stop().await.unwrap();

    assert!(watchdog.check_count() >= 1);
    assert_eq!(h.job(job_id).await.status, JobStatus::Queued);
}

impl Harness {
    fn clock_now(&self) -> u64 {
        use menudraft_domain::Clock;
        self.clock.now_millis()
    }
}
