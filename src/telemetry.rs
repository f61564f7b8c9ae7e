//! Telemetry metric name constants.
//!
//! Centralised metric names for switchyard operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `switchyard_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider id (e.g. "openai", "ollama")
//! - `operation`: gateway operation (e.g. "extract", "generate", "answer")
//! - `status`: attempt outcome: "ok", "error" or "timeout"
//! - `namespace`: cache namespace: "source", "content" or "profile"

/// Total provider attempts issued by the executor.
///
/// Labels: `provider`, `operation`, `status` ("ok" | "error" | "timeout").
pub const REQUESTS_TOTAL: &str = "switchyard_requests_total";

/// Duration of successful provider attempts in seconds.
///
/// Labels: `provider`, `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "switchyard_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`, `operation`.
pub const RETRIES_TOTAL: &str = "switchyard_retries_total";

/// Total attempts that exceeded their per-attempt deadline.
///
/// Labels: `provider`, `operation`.
pub const TIMEOUTS_TOTAL: &str = "switchyard_timeouts_total";

/// Total provider-to-provider fallback transitions.
///
/// Labels: `from`, `operation`.
pub const FALLBACKS_TOTAL: &str = "switchyard_fallbacks_total";

/// Total results produced by the offline heuristic.
///
/// Labels: `operation`.
pub const DEGRADED_TOTAL: &str = "switchyard_degraded_total";

/// Total cache hits.
///
/// Labels: `namespace`.
pub const CACHE_HITS_TOTAL: &str = "switchyard_cache_hits_total";

/// Total cache misses (absent or expired).
///
/// Labels: `namespace`.
pub const CACHE_MISSES_TOTAL: &str = "switchyard_cache_misses_total";

/// Total FIFO evictions.
///
/// Labels: `namespace`.
pub const CACHE_EVICTIONS_TOTAL: &str = "switchyard_cache_evictions_total";

/// Total debounced calls rejected because a newer call replaced them.
pub const DEBOUNCE_SUPERSEDED_TOTAL: &str = "switchyard_debounce_superseded_total";
