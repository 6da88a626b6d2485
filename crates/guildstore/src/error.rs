use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the store.
///
/// Row absence is never an error; reads return defaults instead. What remains
/// is the connection lifecycle, exhausted statement retries, and rejected
/// input.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The initial connection could not be established within the bounded
    /// attempt count. Startup must not proceed past this.
    #[error("database connection failed after {attempts} attempt(s): {source}")]
    ConnectExhausted {
        attempts: u32,
        source: sqlx::Error,
    },

    /// A statement kept failing until the bounded attempt count ran out.
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    RetryExhausted {
        operation: &'static str,
        attempts: u32,
        source: sqlx::Error,
    },

    /// Rejected input, such as an unknown panel color name.
    #[error("validation error: {0}")]
    Validation(String),
}
