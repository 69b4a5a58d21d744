//! Fixed-window rate limiter

use crate::config::RateLimitConfig;
use crate::error::LimiterError;
use crate::metrics::LimiterMetrics;
use menudraft_domain::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Counter for one key within its current window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    /// Requests counted in the window; never exceeds the limit
    pub count: u32,
    /// Millisecond timestamp at which the window ends
    pub reset_at: u64,
}

/// Fixed-window request counter keyed by `prefix:key`
///
/// State is process-local. Behind N instances the effective aggregate
/// limit is `limit × N`.
pub struct RateLimiter {
    records: Mutex<HashMap<String, RateLimitRecord>>,
    metrics: Mutex<LimiterMetrics>,
    clock: Arc<dyn Clock>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RateLimiter {
    /// Create a limiter reading time from the given clock
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            metrics: Mutex::new(LimiterMetrics::new()),
            clock,
        }
    }

    /// Create a limiter on the system clock
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Count one request for `key`.
    ///
    /// A missing record, or one whose window has passed, starts a fresh
    /// window. A key at its limit is rejected without being incremented.
    ///
    /// # Errors
    ///
    /// Returns `LimiterError::RateLimitExceeded` with the seconds left in
    /// the window (rounded up) when the key is at its limit.
    pub fn check(&self, key: &str, config: &RateLimitConfig) -> Result<(), LimiterError> {
        let full_key = format!("{}:{}", config.effective_prefix(), key);
        let now = self.clock.now_millis();

        let mut records = lock(&self.records);
        let record = records
            .entry(full_key)
            .and_modify(|record| {
                if now > record.reset_at {
                    *record = RateLimitRecord {
                        count: 0,
                        reset_at: now.saturating_add(config.window_ms()),
                    };
                }
            })
            .or_insert_with(|| RateLimitRecord {
                count: 0,
                reset_at: now.saturating_add(config.window_ms()),
            });

        if record.count >= config.limit {
            let retry_after_secs = (record.reset_at - now).div_ceil(1000);
            drop(records);
            lock(&self.metrics).record_rejected();
            warn!(
                key = %key,
                prefix = %config.effective_prefix(),
                retry_after_secs,
                "Rate limit exceeded"
            );
            return Err(LimiterError::RateLimitExceeded { retry_after_secs });
        }

        record.count += 1;
        drop(records);
        lock(&self.metrics).record_allowed();
        Ok(())
    }

    /// Delete every record whose window has passed, returning how many
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let removed = {
            let mut records = lock(&self.records);
            let before = records.len();
            records.retain(|_, record| now <= record.reset_at);
            before - records.len()
        };

        lock(&self.metrics).record_sweep(removed);
        debug!("Rate limit sweep removed {} expired records", removed);
        removed
    }

    /// Current record for a raw `prefix:key`, if any
    pub fn record(&self, full_key: &str) -> Option<RateLimitRecord> {
        lock(&self.records).get(full_key).copied()
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        lock(&self.records).len()
    }

    /// Snapshot of the limiter's metrics
    pub fn metrics(&self) -> LimiterMetrics {
        lock(&self.metrics).clone()
    }

    /// Reset the limiter's metrics counters
    pub fn reset_metrics(&self) {
        lock(&self.metrics).reset();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_system_clock()
    }
}
