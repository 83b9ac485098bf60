//! Telemetry metric name constants.
//!
//! Centralised metric names for promptc operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `promptc_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `backend`: adapter identifier (e.g. "openai:gpt-4")
//! - `status`: outcome: "ok" or "error"

/// Total requests sent to a model backend.
///
/// Labels: `backend`, `status` ("ok" | "error").
pub const BACKEND_REQUESTS_TOTAL: &str = "promptc_backend_requests_total";

/// Calls refused by an adapter's local rate window.
///
/// Labels: `backend`.
pub const RATE_LIMITED_TOTAL: &str = "promptc_rate_limited_total";

/// Cache lookups that returned a live entry.
///
/// Labels: `medium` ("file" | "memory").
pub const CACHE_HITS_TOTAL: &str = "promptc_cache_hits_total";

/// Cache lookups that found nothing usable (absent, expired, or undecodable).
///
/// Labels: `medium`.
pub const CACHE_MISSES_TOTAL: &str = "promptc_cache_misses_total";

/// Fresh generations that completed processing and were stored.
///
/// Labels: `backend`.
pub const GENERATIONS_TOTAL: &str = "promptc_generations_total";

/// Re-invocations performed by the caller-side retry helper.
///
/// Labels: `operation`.
pub const RETRIES_TOTAL: &str = "promptc_retries_total";
