//! Auto-responder operations: trigger phrase to canned response.

use std::collections::HashMap;

use futures::FutureExt;

use crate::error::StoreResult;
use crate::metrics::QueryTimer;
use crate::retry::StatementClass;
use crate::store::Store;

impl Store {
    /// The trigger → response mapping. Served from cache within the TTL; a
    /// failed refresh falls back to the last known mapping, or an empty one.
    pub async fn get_auto_responses(&self) -> HashMap<String, String> {
        self.caches
            .auto_responses
            .read_through(|| async move {
                let timer = QueryTimer::new("get_auto_responses");
                let result = self
                    .conn
                    .run("get_auto_responses", StatementClass::Idempotent, |conn| {
                        async move {
                            let rows: Vec<(String, String)> =
                                sqlx::query_as("SELECT trigger, response FROM auto_responder")
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

    /// Creates or replaces the response for a trigger. Last write wins.
    pub async fn add_auto_response(&self, trigger: &str, response: &str) -> StoreResult<()> {
        let trigger = trigger.to_owned();
        let response = response.to_owned();

        let timer = QueryTimer::new("add_auto_response");
        let result = self
            .conn
            .run(
                "add_auto_response",
                StatementClass::Idempotent,
                move |conn| {
                    sqlx::query(
                        r#"
                        INSERT INTO auto_responder (trigger, response)
                        VALUES ($1, $2)
                        ON CONFLICT (trigger)
                        DO UPDATE SET response = EXCLUDED.response
                        "#,
                    )
                    .bind(trigger.clone())
                    .bind(response.clone())
                    .execute(conn)
                    .boxed()
                },
            )
            .await;
        timer.record();
        self.caches.auto_responses.invalidate();
        result?;
        Ok(())
    }

    /// Deletes a trigger. Returns whether it existed; removing an absent
    /// trigger is a no-op.
    pub async fn remove_auto_response(&self, trigger: &str) -> StoreResult<bool> {
        let trigger = trigger.to_owned();

        let timer = QueryTimer::new("remove_auto_response");
        let result = self
            .conn
            .run(
                "remove_auto_response",
                StatementClass::Idempotent,
                move |conn| {
                    sqlx::query("DELETE FROM auto_responder WHERE trigger = $1")
                        .bind(trigger.clone())
                        .execute(conn)
                        .boxed()
                },
            )
            .await;
        timer.record();
        self.caches.auto_responses.invalidate();
        Ok(result?.rows_affected() > 0)
    }
}
