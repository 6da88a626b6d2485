//! Economy balance operations.
//!
//! Balances are money; they are never cached, and every mutation is a single
//! atomic upsert so interleaved tasks cannot lose an update to a
//! check-then-write race.

use futures::FutureExt;

use crate::error::StoreResult;
use crate::metrics::QueryTimer;
use crate::retry::StatementClass;
use crate::store::Store;

impl Store {
    /// Current balance for a user; 0 when the user has no row yet.
    pub async fn get_balance(&self, user_id: i64) -> StoreResult<i64> {
        let timer = QueryTimer::new("get_balance");
        let result = self
            .conn
            .run("get_balance", StatementClass::Idempotent, move |conn| {
                sqlx::query_scalar::<_, i64>("SELECT balance FROM economy WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_optional(conn)
                    .boxed()
            })
            .await;
        timer.record();
        Ok(result?.unwrap_or(0))
    }

    /// Sets the balance to an absolute amount, creating the row if needed.
    pub async fn set_balance(&self, user_id: i64, amount: i64) -> StoreResult<()> {
        let timer = QueryTimer::new("set_balance");
        let result = self
            .conn
            .run("set_balance", StatementClass::Idempotent, move |conn| {
                sqlx::query(
                    r#"
                    INSERT INTO economy (user_id, balance)
                    VALUES ($1, $2)
                    ON CONFLICT (user_id)
                    DO UPDATE SET balance = EXCLUDED.balance
                    "#,
                )
                .bind(user_id)
                .bind(amount)
                .execute(conn)
                .boxed()
            })
            .await;
        timer.record();
        result?;
        Ok(())
    }

    /// Adds to the balance and returns the new value.
    pub async fn add_balance(&self, user_id: i64, amount: i64) -> StoreResult<i64> {
        let timer = QueryTimer::new("add_balance");
        let result = self
            .conn
            .run("add_balance", StatementClass::NonIdempotent, move |conn| {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO economy (user_id, balance)
                    VALUES ($1, $2)
                    ON CONFLICT (user_id)
                    DO UPDATE SET balance = economy.balance + EXCLUDED.balance
                    RETURNING balance
                    "#,
                )
                .bind(user_id)
                .bind(amount)
                .fetch_one(conn)
                .boxed()
            })
            .await;
        timer.record();
        result
    }

    /// Subtracts from the balance, clamping at zero, and returns the new
    /// value. Removing from a user with no row leaves them at zero.
    pub async fn remove_balance(&self, user_id: i64, amount: i64) -> StoreResult<i64> {
        let timer = QueryTimer::new("remove_balance");
        let result = self
            .conn
            .run(
                "remove_balance",
                StatementClass::NonIdempotent,
                move |conn| {
                    sqlx::query_scalar::<_, i64>(
                        r#"
                        INSERT INTO economy (user_id, balance)
                        VALUES ($1, 0)
                        ON CONFLICT (user_id)
                        DO UPDATE SET balance = GREATEST(economy.balance - $2, 0)
                        RETURNING balance
                        "#,
                    )
                    .bind(user_id)
                    .bind(amount)
                    .fetch_one(conn)
                    .boxed()
                },
            )
            .await;
        timer.record();
        result
    }
}
