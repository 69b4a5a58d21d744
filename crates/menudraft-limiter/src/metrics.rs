//! Metrics collection for rate limiting

/// Counters collected by a [`RateLimiter`](crate::RateLimiter)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimiterMetrics {
    /// Requests let through
    pub allowed: u64,

    /// Requests rejected with `RateLimitExceeded`
    pub rejected: u64,

    /// Expired records removed by sweeps
    pub swept: u64,

    /// Total sweep iterations completed
    pub sweep_count: u64,
}

impl LimiterMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an allowed request
    pub fn record_allowed(&mut self) {
        self.allowed += 1;
    }

    /// Record a rejected request
    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// Record a sweep and how many records it removed
    pub fn record_sweep(&mut self, removed: usize) {
        self.sweep_count += 1;
        self.swept += removed as u64;
    }

    /// Share of requests rejected, 0.0 when nothing was checked
    pub fn rejection_rate(&self) -> f64 {
        let total = self.allowed + self.rejected;
        if total == 0 {
            0.0
        } else {
            self.rejected as f64 / total as f64
        }
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Rate Limiter Metrics Summary".to_string(),
            "============================".to_string(),
            format!("Allowed: {}", self.allowed),
            format!("Rejected: {}", self.rejected),
            format!("Rejection rate: {:.1}%", self.rejection_rate() * 100.0),
            format!("Sweep cycles: {}", self.sweep_count),
            format!("Records swept: {}", self.swept),
        ]
        .join("\n")
    }
}
