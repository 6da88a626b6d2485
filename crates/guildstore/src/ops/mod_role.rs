//! Moderator role set operations.

use futures::FutureExt;

use crate::error::StoreResult;
use crate::metrics::QueryTimer;
use crate::retry::StatementClass;
use crate::store::Store;

impl Store {
    /// All moderator role ids, sorted. Served from cache within the TTL; a
    /// failed refresh falls back to the last known set, or an empty one.
    pub async fn get_mod_roles(&self) -> Vec<i64> {
        self.caches
            .mod_roles
            .read_through(|| async move {
                let timer = QueryTimer::new("get_mod_roles");
                let result = self
                    .conn
                    .run("get_mod_roles", StatementClass::Idempotent, |conn| {
                        sqlx::query_scalar::<_, i64>(
                            "SELECT role_id FROM mod_roles ORDER BY role_id",
                        )
                        .fetch_all(conn)
                        .boxed()
                    })
                    .await;
                timer.record();
                result
            })
            .await
    }

    /// Grants moderator status to a role. Granting it twice is a no-op.
    pub async fn add_mod_role(&self, role_id: i64) -> StoreResult<()> {
        let timer = QueryTimer::new("add_mod_role");
        let result = self
            .conn
            .run("add_mod_role", StatementClass::Idempotent, move |conn| {
                sqlx::query(
                    "INSERT INTO mod_roles (role_id) VALUES ($1) ON CONFLICT (role_id) DO NOTHING",
                )
                .bind(role_id)
                .execute(conn)
                .boxed()
            })
            .await;
        timer.record();
        // Invalidate even on failure: an ambiguous error may have applied
        // server-side.
        self.caches.mod_roles.invalidate();
        result?;
        Ok(())
    }

    /// Revokes moderator status. Returns whether the role was present;
    /// removing an absent role is a no-op.
    pub async fn remove_mod_role(&self, role_id: i64) -> StoreResult<bool> {
        let timer = QueryTimer::new("remove_mod_role");
        let result = self
            .conn
            .run("remove_mod_role", StatementClass::Idempotent, move |conn| {
                sqlx::query("DELETE FROM mod_roles WHERE role_id = $1")
                    .bind(role_id)
                    .execute(conn)
                    .boxed()
            })
            .await;
        timer.record();
        self.caches.mod_roles.invalidate();
        Ok(result?.rows_affected() > 0)
    }
}
