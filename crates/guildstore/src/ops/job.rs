//! Job salary operations: role id to per-shift salary.

use std::collections::HashMap;

use futures::FutureExt;

use crate::error::StoreResult;
use crate::metrics::QueryTimer;
use crate::retry::StatementClass;
use crate::store::Store;

impl Store {
    /// The role → salary mapping. Served from cache within the TTL; a
    /// failed refresh falls back to the last known mapping, or an empty one.
    pub async fn get_jobs(&self) -> HashMap<i64, i64> {
        self.caches
            .jobs
            .read_through(|| async move {
                let timer = QueryTimer::new("get_jobs");
                let result = self
                    .conn
                    .run("get_jobs", StatementClass::Idempotent, |conn| {
                        async move {
                            let rows: Vec<(i64, i64)> =
                                sqlx::query_as("SELECT role_id, salary FROM jobs")
                                    .fetch_all(conn)
                                    .await?;
                            Ok(rows.into_iter().collect())
                        }
                        .boxed()
                    })
                    .await;
                timer.record();
                result
            })
            .await
    }

    /// Creates or updates the salary paid for holding a role.
    pub async fn add_job(&self, role_id: i64, salary: i64) -> StoreResult<()> {
        let timer = QueryTimer::new("add_job");
        let result = self
            .conn
            .run("add_job", StatementClass::Idempotent, move |conn| {
                sqlx::query(
                    r#"
                    INSERT INTO jobs (role_id, salary)
                    VALUES ($1, $2)
                    ON CONFLICT (role_id)
                    DO UPDATE SET salary = EXCLUDED.salary
                    "#,
                )
                .bind(role_id)
                .bind(salary)
                .execute(conn)
                .boxed()
            })
            .await;
        timer.record();
        self.caches.jobs.invalidate();
        result?;
        Ok(())
    }

    /// Deletes a job. Returns whether it existed; removing an absent job is
    /// a no-op.
    pub async fn remove_job(&self, role_id: i64) -> StoreResult<bool> {
        let timer = QueryTimer::new("remove_job");
        let result = self
            .conn
            .run("remove_job", StatementClass::Idempotent, move |conn| {
                sqlx::query("DELETE FROM jobs WHERE role_id = $1")
                    .bind(role_id)
                    .execute(conn)
                    .boxed()
            })
            .await;
        timer.record();
        self.caches.jobs.invalidate();
        Ok(result?.rows_affected() > 0)
    }
}
