//! Bounded retry policy shared by connection setup and statement execution.

use std::time::Duration;

use crate::config::RetryConfig;

/// Whether a statement can be re-issued safely after an ambiguous failure.
///
/// A statement whose acknowledgment was lost may already have applied
/// server-side before the connection died. Re-running an absolute upsert or a
/// keyed delete converges to the same state; re-running relative arithmetic
/// or an append can apply twice. Writes are therefore at-most-retried, not
/// exactly-once, and the executor logs a warning before retrying a
/// `NonIdempotent` statement so the risk stays visible at each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementClass {
    /// Re-running converges: absolute upserts, keyed deletes, reads.
    Idempotent,
    /// Re-running can double-apply: appends and relative arithmetic.
    NonIdempotent,
}

/// Fixed-delay retry policy with a bounded attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never zero.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_secs(config.delay_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_new_clamps_zero_attempts() {
        let policy = RetryPolicy::new(0, Duration::from_millis(100));
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_from_retry_config() {
        let config = RetryConfig {
            max_attempts: 5,
            delay_secs: 2,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }
}
