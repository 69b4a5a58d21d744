//! menudraft Rate Limiter
//!
//! Fixed-window request counting keyed by an arbitrary string (the
//! organization id), with a background sweep of expired windows.
//!
//! # Overview
//!
//! - **Check**: [`RateLimiter::check`] counts a request against
//!   `prefix:key`. The first request of a window opens it for
//!   `window_secs`; requests beyond `limit` are rejected with the seconds
//!   left in the window.
//! - **Sweep**: [`SweepWorker`] deletes every record whose window has
//!   passed, on a fixed interval independent of traffic.
//! - **Metrics**: [`LimiterMetrics`] counts allowed, rejected and swept.
//!
//! # Deployment note
//!
//! Counters live in process memory. Each instance enforces its own window,
//! so behind N instances the aggregate limit per key is `limit × N`.
//!
//! # Usage
//!
//! ```
//! use menudraft_domain::ManualClock;
//! use menudraft_limiter::{LimiterError, RateLimitConfig, RateLimiter};
//! use std::sync::Arc;
//!
//! let limiter = RateLimiter::new(Arc::new(ManualClock::new(0)));
//! let config = RateLimitConfig { limit: 2, ..Default::default() };
//!
//! assert!(limiter.check("org-1", &config).is_ok());
//! assert!(limiter.check("org-1", &config).is_ok());
//! assert_eq!(
//!     limiter.check("org-1", &config),
//!     Err(LimiterError::RateLimitExceeded { retry_after_secs: 60 })
//! );
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod limiter;
mod metrics;
mod worker;

pub use config::{RateLimitConfig, DEFAULT_KEY_PREFIX};
pub use error::LimiterError;
pub use limiter::{RateLimitRecord, RateLimiter};
pub use metrics::LimiterMetrics;
pub use worker::{SweepWorker, SweeperHandle};
