//! Background sweep of expired rate-limit records

use crate::{LimiterError, RateLimiter};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Background worker that sweeps a [`RateLimiter`] on a fixed interval
///
/// The sweep runs independently of traffic, so idle keys do not pile up.
///
/// # Examples
///
/// ```no_run
/// use menudraft_limiter::{RateLimiter, SweepWorker};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let limiter = Arc::new(RateLimiter::with_system_clock());
///     let handle = SweepWorker::new(limiter, Duration::from_secs(300)).start();
///
///     // ... serve requests ...
///
///     handle.stop().await?;
///     Ok(())
/// }
/// ```
pub struct SweepWorker {
    limiter: Arc<RateLimiter>,
    interval: Duration,
}

/// Handle to a running [`SweepWorker`]
pub struct SweeperHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SweepWorker {
    /// Create a worker sweeping `limiter` every `interval`
    pub fn new(limiter: Arc<RateLimiter>, interval: Duration) -> Self {
        Self { limiter, interval }
    }

    /// Spawn the sweep loop on the current tokio runtime
    pub fn start(self) -> SweeperHandle {
        let (shutdown, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!("Rate limit sweeper started (interval: {:?})", self.interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.limiter.sweep();
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }

            tracing::info!(
                "Rate limit sweeper stopped. Final metrics:\n{}",
                self.limiter.metrics().summary()
            );
        });

        SweeperHandle { shutdown, task }
    }

    /// Run for a specific number of cycles (useful for testing)
    pub async fn run_cycles(&self, cycles: usize) -> usize {
        let mut ticker = interval(self.interval);
        let mut removed = 0;
        for _ in 0..cycles {
            ticker.tick().await;
            removed += self.limiter.sweep();
        }
        removed
    }
}

impl SweeperHandle {
    /// Signal the sweep loop to stop and wait for it to finish
    ///
    /// # Errors
    ///
    /// Returns `LimiterError::Worker` if the sweep task panicked.
    pub async fn stop(self) -> Result<(), LimiterError> {
        // the task may already be gone; joining reports why
        let _ = self.shutdown.send(());
        self.task
            .await
            .map_err(|e| LimiterError::Worker(e.to_string()))
    }

    /// Whether the sweep task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
