//! HTTP request handlers for the extraction service.
//!
//! Implements enqueue, run, job lookup and health check endpoints using axum.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use menudraft_domain::traits::{AttachmentRepository, JobRepository, LlmProvider};
use menudraft_domain::Job;
use menudraft_runner::{
    parse_attachment_id, parse_job_id, EnqueueResult, JobRunner, RunError, RunResult,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Shared application state
pub struct AppState<J, A, L>
where
    J: JobRepository,
    A: AttachmentRepository,
    L: LlmProvider,
{
    /// Job runner driving every request
    pub runner: Arc<JobRunner<J, A, L>>,
}

impl<J, A, L> Clone for AppState<J, A, L>
where
    J: JobRepository,
    A: AttachmentRepository,
    L: LlmProvider,
{
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
        }
    }
}

/// Enqueue request body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueRequest {
    /// Attachment to extract from
    #[serde(default)]
    pub attachment_id: Option<String>,
}

/// Run request body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Job to run
    #[serde(default)]
    pub job_id: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Provider recorded on new jobs
    pub provider: String,
    /// Rate-limit keys currently tracked by this instance
    pub tracked_rate_limit_keys: usize,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Seconds until the caller may retry (rate limiting only)
    #[serde(rename = "retryAfterSeconds", skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Error from the job runner
    Run(RunError),
    /// Request body is not valid JSON
    InvalidBody(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match self {
            AppError::InvalidBody(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Run(e) => {
                let status = match &e {
                    RunError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                    RunError::NotFound(_) => StatusCode::NOT_FOUND,
                    RunError::InProgress(_) => StatusCode::CONFLICT,
                    RunError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                    RunError::ExtractionFailed(_) | RunError::Repository(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                let retry_after = match &e {
                    RunError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
                    _ => None,
                };
                let message = match e {
                    RunError::ExtractionFailed(msg) => msg,
                    other => other.to_string(),
                };
                (status, message, retry_after)
            }
        };

        if status.is_server_error() {
            warn!("Request failed with {}: {}", status, message);
        }

        let body = Json(ErrorResponse {
            error: message,
            retry_after_seconds: retry_after,
        });
        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<RunError> for AppError {
    fn from(e: RunError) -> Self {
        AppError::Run(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::InvalidBody(e.body_text())
    }
}

/// POST /ocr/enqueue - Create a queued job for an attachment
async fn enqueue<J, A, L>(
    State(state): State<AppState<J, A, L>>,
    body: Result<Json<EnqueueRequest>, JsonRejection>,
) -> Result<Json<EnqueueResult>, AppError>
where
    J: JobRepository + 'static,
    A: AttachmentRepository + 'static,
    L: LlmProvider + 'static,
{
    let Json(request) = body?;
    let attachment_id = parse_attachment_id(request.attachment_id.as_deref())?;
    let result = state.runner.enqueue(attachment_id).await?;
    Ok(Json(result))
}

/// POST /ocr/run - Run a job and return its draft
async fn run<J, A, L>(
    State(state): State<AppState<J, A, L>>,
    body: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<RunResult>, AppError>
where
    J: JobRepository + 'static,
    A: AttachmentRepository + 'static,
    L: LlmProvider + 'static,
{
    let Json(request) = body?;
    let job_id = parse_job_id(request.job_id.as_deref())?;
    let result = state.runner.run(job_id).await?;
    Ok(Json(result))
}

/// GET /ocr/jobs/:id - Job record, including status and draft
async fn get_job<J, A, L>(
    State(state): State<AppState<J, A, L>>,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError>
where
    J: JobRepository + 'static,
    A: AttachmentRepository + 'static,
    L: LlmProvider + 'static,
{
    let job_id = parse_job_id(Some(id.as_str()))?;
    let job = state.runner.get_job(job_id).await?;
    Ok(Json(job))
}

/// GET /health - Liveness plus provider and limiter state
async fn health_check<J, A, L>(State(state): State<AppState<J, A, L>>) -> Json<HealthCheckResponse>
where
    J: JobRepository + 'static,
    A: AttachmentRepository + 'static,
    L: LlmProvider + 'static,
{
    Json(HealthCheckResponse {
        status: "ok".to_string(),
        provider: state.runner.provider().to_string(),
        tracked_rate_limit_keys: state.runner.limiter().tracked_keys(),
    })
}

/// Create the axum router with all routes
pub fn create_router<J, A, L>(state: AppState<J, A, L>) -> AxumRouter
where
    J: JobRepository + 'static,
    A: AttachmentRepository + 'static,
    L: LlmProvider + 'static,
{
    AxumRouter::new()
        .route("/ocr/enqueue", post(enqueue::<J, A, L>))
        .route("/ocr/run", post(run::<J, A, L>))
        .route("/ocr/jobs/:id", get(get_job::<J, A, L>))
        .route("/health", get(health_check::<J, A, L>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use menudraft_domain::ManualClock;
    use menudraft_limiter::RateLimiter;
    use menudraft_llm::MockProvider;
    use menudraft_runner::RunnerConfig;
    use menudraft_store::{InMemoryAttachmentStore, InMemoryJobStore};
    use tower::ServiceExt; // for oneshot

    fn create_test_state() -> AppState<InMemoryJobStore, InMemoryAttachmentStore, MockProvider> {
        let clock = Arc::new(ManualClock::new(0));
        let runner = JobRunner::new(
            Arc::new(InMemoryJobStore::new()),
            Arc::new(InMemoryAttachmentStore::new()),
            Arc::new(RateLimiter::new(clock.clone())),
            clock,
            RunnerConfig::default(),
        );
        AppState {
            runner: Arc::new(runner),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_enqueue_without_attachment_id() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .method("POST")
            .uri("/ocr/enqueue")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_rate_limited_response_headers() {
        let response = AppError::Run(RunError::RateLimited {
            retry_after_secs: 42,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (RunError::InvalidArgument("x".into()), StatusCode::BAD_REQUEST),
            (RunError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                RunError::InProgress(menudraft_domain::JobId::new()),
                StatusCode::CONFLICT,
            ),
            (RunError::ExtractionFailed("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (RunError::Repository("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(AppError::Run(error).into_response().status(), status);
        }
    }
}
