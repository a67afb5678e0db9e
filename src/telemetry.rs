//! Telemetry metric name constants.
//!
//! Centralised metric names for tolk operations. Consumers install their own
//! `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `tolk_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `status`: outcome: "ok" or "error" (loads), "completed" or "failed" (tasks)
//! - `pair`: language pair in `source-target` form

/// Tasks accepted by `submit` and placed on the queue.
pub const TASKS_SUBMITTED_TOTAL: &str = "tolk_tasks_submitted_total";

/// Tasks that reached a terminal state.
///
/// Labels: `status` ("completed" | "failed").
pub const TASKS_FINISHED_TOTAL: &str = "tolk_tasks_finished_total";

/// Jobs waiting in the worker queue.
pub const QUEUE_DEPTH: &str = "tolk_queue_depth";

/// Wall time spent translating one task, including model resolution.
///
/// Labels: `pair`.
pub const TRANSLATION_DURATION_SECONDS: &str = "tolk_translation_duration_seconds";

/// Chunks translated for inputs over the chunking threshold.
pub const TRANSLATION_CHUNKS_TOTAL: &str = "tolk_translation_chunks_total";

/// Model cache hits.
pub const MODEL_CACHE_HITS_TOTAL: &str = "tolk_model_cache_hits_total";

/// Model cache misses.
pub const MODEL_CACHE_MISSES_TOTAL: &str = "tolk_model_cache_misses_total";

/// Model loads.
///
/// Labels: `status` ("ok" | "error").
pub const MODEL_LOADS_TOTAL: &str = "tolk_model_loads_total";

/// Model load duration in seconds (successful loads only).
pub const MODEL_LOAD_DURATION_SECONDS: &str = "tolk_model_load_duration_seconds";

/// Models evicted from the cache.
pub const MODEL_EVICTIONS_TOTAL: &str = "tolk_model_evictions_total";

/// Retry attempts against the translation backend (not counting the first try).
///
/// Labels: `backend`, `operation`.
pub const RETRIES_TOTAL: &str = "tolk_retries_total";
