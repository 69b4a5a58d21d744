//! menudraft Server
//!
//! HTTP surface for menu extraction jobs. Wires the SQLite stores, the
//! optional Gemini provider, the rate limiter and the stuck-job watchdog
//! into a [`JobRunner`] and serves it with axum.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::{ProviderKind, ServiceConfig};
use handlers::{create_router, AppState};
use menudraft_domain::{Clock, SystemClock};
use menudraft_extractor::AiExtractor;
use menudraft_limiter::{RateLimiter, SweepWorker};
use menudraft_llm::GeminiProvider;
use menudraft_runner::{JobRunner, RunnerConfig, Watchdog};
use menudraft_store::{SqliteAttachmentStore, SqliteJobStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Runner type served in production
pub type ServiceRunner = JobRunner<SqliteJobStore, SqliteAttachmentStore, GeminiProvider>;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Store could not be opened
    #[error("Store error: {0}")]
    Store(#[from] menudraft_store::StoreError),

    /// Provider could not be created
    #[error("Provider error: {0}")]
    Provider(#[from] menudraft_llm::LlmError),

    /// Extractor rejected its configuration
    #[error("Extractor error: {0}")]
    Extractor(#[from] menudraft_extractor::ExtractorError),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build the runner and its shared pieces from configuration
///
/// Returns the runner together with the job store so the watchdog can
/// share it.
pub fn build_runner(
    config: &ServiceConfig,
    clock: Arc<dyn Clock>,
) -> Result<(ServiceRunner, Arc<SqliteJobStore>), ServerError> {
    let jobs = Arc::new(SqliteJobStore::new(&config.database_path)?);
    let attachments = Arc::new(SqliteAttachmentStore::new(
        &config.database_path,
        config.attachments_root.clone(),
    )?);
    let limiter = Arc::new(RateLimiter::new(clock.clone()));

    let runner_config = RunnerConfig {
        provider: config.provider.kind.as_str().to_string(),
        rate_limit: config.rate_limit.clone(),
    };

    let mut runner = JobRunner::new(jobs.clone(), attachments, limiter, clock, runner_config);

    if config.provider.kind == ProviderKind::Gemini {
        let provider = GeminiProvider::with_timeout(
            config.provider.endpoint.clone(),
            config.provider.model.clone(),
            config.provider.api_key.clone(),
            config.provider.timeout(),
        )?
        .with_max_retries(config.provider.max_retries);
        let extractor = AiExtractor::new(provider, config.extractor.clone())?;
        runner = runner.with_ai_extractor(extractor);
    }

    Ok((runner, jobs))
}

/// Install the global tracing subscriber (`RUST_LOG`, default `info`)
///
/// Returns `false` when a subscriber was already installed, which is
/// expected when tests or an embedding binary set one up first.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        Ok(()) => true,
        Err(e) => {
            debug!("Tracing subscriber already installed: {}", e);
            false
        }
    }
}

/// Start the HTTP server
///
/// Opens the stores, starts the rate-limit sweeper and the watchdog, and
/// serves until Ctrl-C. Call [`init_tracing`] first to see its logs.
pub async fn start_server(config: ServiceConfig) -> Result<(), ServerError> {
    info!("Starting menudraft server");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path.display());
    info!("Provider: {}", config.provider.kind.as_str());
    info!(
        "Rate limit: {} per {}s (prefix '{}')",
        config.rate_limit.limit,
        config.rate_limit.window_secs,
        config.rate_limit.effective_prefix()
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (runner, jobs) = build_runner(&config, clock.clone())?;
    let runner = Arc::new(runner);

    let sweeper = SweepWorker::new(runner.limiter().clone(), config.rate_limit.sweep_interval()).start();

    let watchdog = if config.watchdog.enabled {
        Some(Arc::new(Watchdog::new(jobs, clock, config.watchdog.clone())).start())
    } else {
        warn!("Watchdog disabled; jobs abandoned in processing stay there");
        None
    };

    let app = create_router(AppState { runner });

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Listening on {}", config.bind_addr());

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()));

    if let Err(e) = sweeper.stop().await {
        warn!("Sweeper did not stop cleanly: {}", e);
    }
    if let Some(handle) = watchdog {
        if let Err(e) = handle.stop().await {
            warn!("Watchdog did not stop cleanly: {}", e);
        }
    }

    info!("Server stopped");
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
