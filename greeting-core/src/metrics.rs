//! Counters for the greeting pipeline.
//!
//! Recorded through the `metrics` facade; they are no-ops until a recorder
//! is installed by the host application.

use metrics::counter;

// Metric names as constants for consistency
const GENERATIONS_TOTAL: &str = "greeting_generations_total";
const PERSISTENCE_FAILURES_TOTAL: &str = "greeting_persistence_failures_total";
const CAPTURES_TOTAL: &str = "greeting_captures_total";
const SHARES_TOTAL: &str = "greeting_shares_total";

/// Record a finished generation.
///
/// * `source` - `external` or `fallback`
pub fn record_generation(source: &str) {
    counter!(GENERATIONS_TOTAL, "source" => source.to_string()).increment(1);
}

/// Record a discarded persistence failure.
pub fn record_persistence_failure(store: &str) {
    counter!(PERSISTENCE_FAILURES_TOTAL, "store" => store.to_string()).increment(1);
}

/// Record a card capture attempt.
///
/// * `outcome` - `ok` or `failed`
pub fn record_capture(outcome: &str) {
    counter!(CAPTURES_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

/// Record a share attempt.
///
/// * `outcome` - `shared`, `unsupported` or `failed`
pub fn record_share(outcome: &str) {
    counter!(SHARES_TOTAL, "outcome" => outcome.to_string()).increment(1);
}
