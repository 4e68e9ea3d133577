//! Metrics collection.
//!
//! # Responsibilities
//! - Define uploader metrics (attempts, outcomes, cache effectiveness)
//! - Track per-backend reachability
//!
//! # Metrics
//! - `banter_upload_attempts_total` (counter): store attempts by backend, result
//! - `banter_uploads_total` (counter): logical uploads by backend, outcome
//! - `banter_upload_duration_seconds` (histogram): end-to-end upload latency
//! - `banter_availability_cache_total` (counter): cache lookups by result (hit/miss)
//! - `banter_backend_reachable` (gauge): 1=reachable, 0=unreachable
//!
//! # Design Decisions
//! - Only the `metrics` facade is used; the embedding process installs a recorder
//! - Without a recorder every call is a no-op

use std::time::Instant;

/// Record a single store attempt.
pub fn record_upload_attempt(backend: &str, result: &'static str) {
    ::metrics::counter!(
        "banter_upload_attempts_total",
        "backend" => backend.to_string(),
        "result" => result
    )
    .increment(1);
}

/// Record the outcome of a logical upload.
pub fn record_upload(backend: &str, outcome: &'static str, start: Instant) {
    ::metrics::counter!(
        "banter_uploads_total",
        "backend" => backend.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!("banter_upload_duration_seconds", "backend" => backend.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record an availability cache lookup.
pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    ::metrics::counter!("banter_availability_cache_total", "result" => result).increment(1);
}

/// Record backend reachability after a live probe.
pub fn record_backend_health(backend: &str, reachable: bool) {
    ::metrics::gauge!("banter_backend_reachable", "backend" => backend.to_string())
        .set(if reachable { 1.0 } else { 0.0 });
}
