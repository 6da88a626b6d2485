//! Daily claim cooldown operations.

use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;

use crate::error::StoreResult;
use crate::metrics::QueryTimer;
use crate::retry::StatementClass;
use crate::store::Store;

const CLAIM_INTERVAL_HOURS: i64 = 24;

/// True when at least 24 hours have passed since the last claim, or there
/// has been no claim at all. The boundary itself allows the claim.
fn claim_allowed(last_claim: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_claim {
        None => true,
        Some(last) => now - last >= Duration::hours(CLAIM_INTERVAL_HOURS),
    }
}

impl Store {
    /// Whether the user may claim the daily reward right now.
    pub async fn can_claim_daily(&self, user_id: i64) -> StoreResult<bool> {
        let timer = QueryTimer::new("can_claim_daily");
        let result = self
            .conn
            .run("can_claim_daily", StatementClass::Idempotent, move |conn| {
                sqlx::query_scalar::<_, DateTime<Utc>>(
                    "SELECT last_claim FROM daily_cooldown WHERE user_id = $1",
                )
                .bind(user_id)
                .fetch_optional(conn)
                .boxed()
            })
            .await;
        timer.record();
        Ok(claim_allowed(result?, Utc::now()))
    }

    /// Records a claim at the current time, replacing any earlier mark.
    pub async fn set_daily_claimed(&self, user_id: i64) -> StoreResult<()> {
        // Bound once so retried attempts write the same instant
        let now = Utc::now();

        let timer = QueryTimer::new("set_daily_claimed");
        let result = self
            .conn
            .run(
                "set_daily_claimed",
                StatementClass::Idempotent,
                move |conn| {
                    sqlx::query(
                        r#"
                        INSERT INTO daily_cooldown (user_id, last_claim)
                        VALUES ($1, $2)
                        ON CONFLICT (user_id)
                        DO UPDATE SET last_claim = EXCLUDED.last_claim
                        "#,
                    )
                    .bind(user_id)
                    .bind(now)
                    .execute(conn)
                    .boxed()
                },
            )
            .await;
        timer.record();
        result?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_allowed_without_prior_claim() {
        assert!(claim_allowed(None, Utc::now()));
    }

    #[test]
    fn test_claim_blocked_inside_interval() {
        let now = Utc::now();
        assert!(!claim_allowed(Some(now - Duration::hours(1)), now));
        assert!(!claim_allowed(Some(now - Duration::hours(23)), now));
    }

    #[test]
    fn test_claim_allowed_after_interval() {
        let now = Utc::now();
        assert!(claim_allowed(Some(now - Duration::hours(25)), now));
    }

    #[test]
    fn test_claim_allowed_exactly_at_boundary() {
        let now = Utc::now();
        assert!(claim_allowed(Some(now - Duration::hours(24)), now));
    }

    #[test]
    fn test_future_claim_mark_blocks() {
        // Clock skew can put the stored mark ahead of now; stay blocked
        let now = Utc::now();
        assert!(!claim_allowed(Some(now + Duration::hours(1)), now));
    }
}
