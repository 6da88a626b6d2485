//! Connection lifecycle and the retryable statement executor.
//!
//! The store holds one logical connection, not a pool. The live handle sits
//! in an async-mutexed slot (the lease); statements borrow it through
//! [`ConnectionManager::run`] and a reconnect swaps the slot under the same
//! lock, so a borrower never observes a torn handle.

use futures::future::BoxFuture;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use crate::metrics;
use crate::retry::{RetryPolicy, StatementClass};

pub struct ConnectionManager {
    options: PgConnectOptions,
    policy: RetryPolicy,
    slot: Mutex<Option<PgConnection>>,
}

impl ConnectionManager {
    pub fn new(database: &DatabaseConfig, policy: RetryPolicy) -> Self {
        Self {
            options: database.connect_options(),
            policy,
            slot: Mutex::new(None),
        }
    }

    /// Establishes the connection, retrying within the bounded attempt
    /// count. Failure here is startup-fatal for the embedding process.
    pub async fn connect(&self) -> StoreResult<()> {
        let mut slot = self.slot.lock().await;
        *slot = Some(self.establish().await?);
        Ok(())
    }

    /// Probes the connection with `SELECT 1` and re-establishes it if the
    /// probe fails. Callers invoke this before sequences that cannot
    /// tolerate a stale session; it also backs health checks.
    pub async fn ensure_connection(&self) -> StoreResult<()> {
        let mut slot = self.slot.lock().await;

        if let Some(conn) = slot.as_mut() {
            match sqlx::query("SELECT 1").execute(&mut *conn).await {
                Ok(_) => return Ok(()),
                Err(err) => {
                    warn!(error = %err, "liveness probe failed, reconnecting");
                    *slot = None;
                }
            }
        }

        metrics::record_reconnect();
        *slot = Some(self.establish().await?);
        Ok(())
    }

    /// Runs one statement through the bounded retry policy.
    ///
    /// Each attempt takes the current handle (establishing one if the slot
    /// is empty), runs the statement, and on failure discards the handle
    /// before the next attempt. The lease is held for the whole operation,
    /// so statements from interleaved tasks stay serialized. The error from
    /// the final attempt is what propagates once attempts are exhausted.
    ///
    /// Statements autocommit individually; there is no separate commit step
    /// to retry. See [`StatementClass`] for what a retry after an ambiguous
    /// failure can mean for a write.
    pub async fn run<T, F>(
        &self,
        operation: &'static str,
        class: StatementClass,
        mut statement: F,
    ) -> StoreResult<T>
    where
        F: for<'c> FnMut(&'c mut PgConnection) -> BoxFuture<'c, Result<T, sqlx::Error>>,
    {
        let mut slot = self.slot.lock().await;
        let mut attempt = 1u32;

        loop {
            let mut conn = match slot.take() {
                Some(conn) => conn,
                None => {
                    metrics::record_reconnect();
                    match self.establish().await {
                        Ok(conn) => conn,
                        Err(StoreError::ConnectExhausted { attempts, source }) => {
                            return Err(StoreError::RetryExhausted {
                                operation,
                                attempts,
                                source,
                            });
                        }
                        Err(other) => return Err(other),
                    }
                }
            };

            match statement(&mut conn).await {
                Ok(value) => {
                    debug!(operation, attempt, "statement ok");
                    *slot = Some(conn);
                    return Ok(value);
                }
                Err(err) if attempt < self.policy.max_attempts => {
                    // The handle may be poisoned mid-protocol; discard it and
                    // reconnect on the next attempt.
                    drop(conn);
                    metrics::record_retry(operation);
                    match class {
                        StatementClass::NonIdempotent => warn!(
                            operation,
                            attempt,
                            error = %err,
                            "retrying a statement that may already have applied"
                        ),
                        StatementClass::Idempotent => warn!(
                            operation,
                            attempt,
                            error = %err,
                            "statement failed, retrying"
                        ),
                    }
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(
                        operation,
                        attempts = attempt,
                        error = %err,
                        "statement failed, attempts exhausted"
                    );
                    return Err(StoreError::RetryExhausted {
                        operation,
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }

    async fn establish(&self) -> StoreResult<PgConnection> {
        let mut attempt = 1u32;
        loop {
            match PgConnection::connect_with(&self.options).await {
                Ok(conn) => {
                    info!(attempt, "database connection established");
                    return Ok(conn);
                }
                Err(err) if attempt < self.policy.max_attempts => {
                    warn!(attempt, error = %err, "database connection failed, retrying");
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(attempts = attempt, error = %err, "database connection failed");
                    return Err(StoreError::ConnectExhausted {
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::time::{Duration, Instant};

    // Port 1 on loopback refuses immediately, which makes the bounded
    // attempt counting observable without a database.
    fn refused_config() -> DatabaseConfig {
        DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            name: "guildstore".to_string(),
            user: "guildstore".to_string(),
            api_key: "unused".to_string(),
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_connect_exhausts_bounded_attempts() {
        let manager = ConnectionManager::new(&refused_config(), fast_policy(2));
        let started = Instant::now();

        let err = manager.connect().await.unwrap_err();
        match err {
            StoreError::ConnectExhausted { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("expected ConnectExhausted, got {other:?}"),
        }

        // Two attempts mean one inter-attempt delay was served
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_run_reports_operation_on_exhaustion() {
        let manager = ConnectionManager::new(&refused_config(), fast_policy(1));

        let err = manager
            .run("probe", StatementClass::Idempotent, |conn| {
                sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(conn).boxed()
            })
            .await
            .unwrap_err();

        match err {
            StoreError::RetryExhausted {
                operation,
                attempts,
                ..
            } => {
                assert_eq!(operation, "probe");
                assert_eq!(attempts, 1);
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ensure_connection_fails_without_service() {
        let manager = ConnectionManager::new(&refused_config(), fast_policy(1));
        let err = manager.ensure_connection().await.unwrap_err();
        assert!(matches!(err, StoreError::ConnectExhausted { .. }));
    }
}
