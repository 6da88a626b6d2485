//! Store metrics collection.
//!
//! Provides functions for recording store-related metrics. Installing a
//! recorder is the embedding application's concern.

use metrics::{counter, histogram};
use std::time::Instant;

/// Record statement duration for a named operation.
pub fn record_query_duration(operation: &str, duration_secs: f64) {
    histogram!(
        "store_query_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// Record a statement retry.
pub fn record_retry(operation: &str) {
    counter!(
        "store_statement_retries_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record a connection being re-established.
pub fn record_reconnect() {
    counter!("store_reconnects_total").increment(1);
}

/// A helper to time store operations and record metrics.
///
/// Usage:
/// ```ignore
/// let timer = QueryTimer::new("get_balance");
/// let result = ...;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    operation: String,
    start: Instant,
}

impl QueryTimer {
    /// Create a new timer for the given operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_query_duration(&self.operation, duration);
    }
}
