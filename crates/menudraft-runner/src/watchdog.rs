//! Background requeue of jobs stuck in `processing`

use crate::config::WatchdogConfig;
use menudraft_domain::traits::JobRepository;
use menudraft_domain::{Clock, JobId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Requeues jobs abandoned in `processing`
///
/// An invocation that dies after claiming a job never moves it on. The
/// watchdog puts such jobs back to `queued` once they have sat in
/// `processing` longer than `stuck_after_secs`, so a later `run` can pick
/// them up.
pub struct Watchdog<J>
where
    J: JobRepository,
{
    jobs: Arc<J>,
    clock: Arc<dyn Clock>,
    config: WatchdogConfig,
    requeued_total: AtomicU64,
    check_count: AtomicU64,
}

/// Handle to a running [`Watchdog`]
pub struct WatchdogHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl<J> Watchdog<J>
where
    J: JobRepository + 'static,
{
    /// Create a watchdog over a job repository
    pub fn new(jobs: Arc<J>, clock: Arc<dyn Clock>, config: WatchdogConfig) -> Self {
        Self {
            jobs,
            clock,
            config,
            requeued_total: AtomicU64::new(0),
            check_count: AtomicU64::new(0),
        }
    }

    /// Requeue every job stuck past the threshold, once
    pub async fn check_once(&self) -> Result<Vec<JobId>, J::Error> {
        let now = self.clock.now_millis();
        let stuck_after_ms = self.config.stuck_after_secs.saturating_mul(1000);
        let cutoff = now.saturating_sub(stuck_after_ms);

        let requeued = self.jobs.requeue_stuck(cutoff, now).await?;
        self.check_count.fetch_add(1, Ordering::Relaxed);
        self.requeued_total
            .fetch_add(requeued.len() as u64, Ordering::Relaxed);

        for id in &requeued {
            tracing::warn!(job_id = %id, "Requeued job stuck in processing");
        }
        tracing::debug!("Watchdog check requeued {} jobs", requeued.len());

        Ok(requeued)
    }

    /// Total jobs requeued since creation
    pub fn requeued_total(&self) -> u64 {
        self.requeued_total.load(Ordering::Relaxed)
    }

    /// Checks completed since creation
    pub fn check_count(&self) -> u64 {
        self.check_count.load(Ordering::Relaxed)
    }

    /// Spawn the check loop on the current tokio runtime
    pub fn start(self: Arc<Self>) -> WatchdogHandle {
        let (shutdown, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = interval(self.config.interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(
                "Watchdog started (interval: {:?}, stuck after: {:?})",
                self.config.interval(),
                self.config.stuck_after()
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.check_once().await {
                            tracing::error!("Watchdog check failed: {}", e);
                        }
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }

            tracing::info!(
                "Watchdog stopped after {} checks, {} jobs requeued",
                self.check_count(),
                self.requeued_total()
            );
        });

        WatchdogHandle { shutdown, task }
    }
}

impl WatchdogHandle {
    /// Signal the check loop to stop and wait for it to finish
    pub async fn stop(self) -> Result<(), tokio::task::JoinError> {
        let _ = self.shutdown.send(());
        self.task.await
    }

    /// Whether the check task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
