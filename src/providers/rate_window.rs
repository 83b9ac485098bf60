//! Sliding-window call quota owned by a single adapter.
//!
//! A [`RateWindow`] records the instants of recent call attempts. Before
//! each backend call the adapter runs [`RateWindow::acquire`], which prunes
//! timestamps that have left the trailing period and either records the new
//! attempt or refuses it with `RateLimited`.
//!
//! The prune-check-append sequence runs under one mutex, so two callers
//! sharing an adapter can never both observe the last free slot. The lock
//! is never held across an `.await`.
//!
//! Timestamps use [`tokio::time::Instant`], which follows the paused test
//! clock (`tokio::time::pause`/`advance`) and the real clock otherwise.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::telemetry;
use crate::{PromptcError, Result};

/// Quota for a rate window: at most `calls` attempts per `period`.
///
/// ```rust
/// # use promptc::providers::RateLimitConfig;
/// # use std::time::Duration;
/// let config = RateLimitConfig::new()
///     .calls(10)
///     .period(Duration::from_secs(30));
/// assert_eq!(config.calls, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum attempts inside one period. Default: 50.
    pub calls: usize,
    /// Length of the trailing window. Default: 60s.
    pub period: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            calls: 50,
            period: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Create a config with the default quota (50 calls per minute).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of calls allowed per period.
    pub fn calls(mut self, calls: usize) -> Self {
        self.calls = calls;
        self
    }

    /// Set the period length.
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }
}

/// Bounded record of recent call attempts.
#[derive(Debug)]
pub struct RateWindow {
    config: RateLimitConfig,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateWindow {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            timestamps: Mutex::new(VecDeque::with_capacity(config.calls)),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Record a call attempt now, or fail with `RateLimited`.
    pub fn acquire(&self, backend: &str) -> Result<()> {
        self.acquire_at(backend, Instant::now())
    }

    /// Record a call attempt at `now`, or fail with `RateLimited`.
    ///
    /// The retry hint is the period minus the time elapsed since the oldest
    /// retained attempt, i.e. the moment a slot frees up.
    pub fn acquire_at(&self, backend: &str, now: Instant) -> Result<()> {
        let mut timestamps = self
            .timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        prune(&mut timestamps, now, self.config.period);

        if timestamps.len() >= self.config.calls {
            let retry_after = match timestamps.front() {
                Some(oldest) => self
                    .config
                    .period
                    .saturating_sub(now.saturating_duration_since(*oldest)),
                None => self.config.period,
            };
            metrics::counter!(telemetry::RATE_LIMITED_TOTAL, "backend" => backend.to_owned())
                .increment(1);
            warn!(
                backend,
                quota = self.config.calls,
                period_secs = self.config.period.as_secs(),
                retry_after_ms = retry_after.as_millis() as u64,
                "local rate window full"
            );
            return Err(PromptcError::RateLimited {
                backend: backend.to_owned(),
                retry_after: Some(retry_after),
            });
        }

        timestamps.push_back(now);
        Ok(())
    }

    /// Number of attempts still inside the trailing period.
    pub fn in_window(&self) -> usize {
        let mut timestamps = self
            .timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        prune(&mut timestamps, Instant::now(), self.config.period);
        timestamps.len()
    }
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, period: Duration) {
    while let Some(oldest) = timestamps.front() {
        if now.saturating_duration_since(*oldest) >= period {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}
