//! Caller-side retry after rate limiting.
//!
//! The pipeline itself never retries: a `RateLimited` error is returned to
//! whoever called it, with the delay hint attached. [`with_retry`] is the
//! helper callers (including the CLI) use to wait out that hint and try
//! again.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::telemetry;
use crate::Result;

/// How often, and how patiently, to re-invoke a rate-limited operation.
///
/// ```rust
/// # use promptc::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(4)
///     .initial_delay(Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first). 1 = no retry.
    /// Default: 1.
    pub max_attempts: u32,
    /// Delay before the first retry when the error carries no hint.
    /// Default: 1s.
    pub initial_delay: Duration,
    /// Upper bound on any single wait, hinted or not. Default: 120s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config allowing `retries` retries after the first attempt.
    pub fn retries(retries: u32) -> Self {
        Self::default().max_attempts(retries.saturating_add(1))
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Exponential backoff for a 0-indexed retry: `initial_delay * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }

    /// Wait before retry number `attempt`, preferring the error's hint.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .map(|hint| hint.min(self.max_delay))
            .unwrap_or_else(|| self.delay_for_attempt(attempt))
    }
}

/// Run `f`, re-running it after transient (rate-limit) failures.
///
/// Waits for the error's `retry_after` hint when present, exponential
/// backoff otherwise. Permanent errors, and the last transient error once
/// attempts run out, are returned unchanged.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: &str, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < attempts => {
                let delay = config.effective_delay(attempt, e.retry_after());
                metrics::counter!(telemetry::RETRIES_TOTAL, "operation" => operation.to_owned())
                    .increment(1);
                warn!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "retrying after rate limit"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PromptcError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn limited(hint: Option<Duration>) -> PromptcError {
        PromptcError::RateLimited {
            backend: "test".into(),
            retry_after: hint,
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let config = RetryConfig::new()
            .initial_delay(Duration::from_secs(1))
            .max_delay(Duration::from_secs(5));
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(5));
        assert_eq!(config.delay_for_attempt(40), Duration::from_secs(5));
    }

    #[test]
    fn hint_takes_precedence_but_is_capped() {
        let config = RetryConfig::new().max_delay(Duration::from_secs(10));
        assert_eq!(
            config.effective_delay(0, Some(Duration::from_secs(3))),
            Duration::from_secs(3)
        );
        assert_eq!(
            config.effective_delay(0, Some(Duration::from_secs(60))),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn retries_counts_extra_attempts() {
        assert_eq!(RetryConfig::retries(0).max_attempts, 1);
        assert_eq!(RetryConfig::retries(3).max_attempts, 4);
        assert_eq!(RetryConfig::retries(u32::MAX).max_attempts, u32::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_hint_then_succeeds() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result = with_retry(&RetryConfig::retries(2), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(limited(Some(Duration::from_secs(7))))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&RetryConfig::retries(2), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(limited(None))
        })
        .await;

        assert!(matches!(result, Err(PromptcError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&RetryConfig::retries(5), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(PromptcError::Backend {
                backend: "test".into(),
                message: "HTTP 500".into(),
            })
        })
        .await;

        assert!(matches!(result, Err(PromptcError::Backend { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&RetryConfig::new().max_attempts(0), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        })
        .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
