//! Support ticket lifecycle operations.

use std::sync::atomic::Ordering;

use futures::FutureExt;

use crate::entities::{Ticket, TicketAction, TicketLog};
use crate::error::StoreResult;
use crate::metrics::QueryTimer;
use crate::retry::StatementClass;
use crate::schema;
use crate::store::Store;

impl Store {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens a ticket for a user in a channel, logs the creation with the
    /// opening user noted, and returns the ticket id.
    ///
    /// Storage does not enforce one open ticket per channel; callers check
    /// [`Store::get_open_ticket`] first.
    pub async fn create_ticket(&self, user_id: i64, channel_id: i64) -> StoreResult<i64> {
        self.ensure_ticket_tables().await?;

        let timer = QueryTimer::new("create_ticket");
        let result = self
            .conn
            .run(
                "create_ticket",
                StatementClass::NonIdempotent,
                move |conn| {
                    sqlx::query_scalar::<_, i64>(
                        "INSERT INTO tickets (user_id, channel_id) VALUES ($1, $2) RETURNING id",
                    )
                    .bind(user_id)
                    .bind(channel_id)
                    .fetch_one(conn)
                    .boxed()
                },
            )
            .await;
        timer.record();

        let ticket_id = result?;
        let details = format!("opened by user {user_id}");
        self.append_ticket_log(ticket_id, TicketAction::Created, Some(details))
            .await?;
        Ok(ticket_id)
    }

    /// Closes the open ticket in a channel by stamping its closing time,
    /// logs the closure, and returns the ticket id. Returns `None` when the
    /// channel has no open ticket; the closed row is never deleted.
    pub async fn close_ticket(&self, channel_id: i64) -> StoreResult<Option<i64>> {
        self.ensure_ticket_tables().await?;

        let timer = QueryTimer::new("close_ticket");
        let result = self
            .conn
            .run("close_ticket", StatementClass::Idempotent, move |conn| {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    UPDATE tickets
                    SET closed_at = NOW()
                    WHERE channel_id = $1 AND closed_at IS NULL
                    RETURNING id
                    "#,
                )
                .bind(channel_id)
                .fetch_optional(conn)
                .boxed()
            })
            .await;
        timer.record();

        let ticket_id = result?;
        if let Some(id) = ticket_id {
            self.append_ticket_log(id, TicketAction::Closed, None).await?;
        }
        Ok(ticket_id)
    }

    /// The open ticket bound to a channel, if any.
    pub async fn get_open_ticket(&self, channel_id: i64) -> StoreResult<Option<Ticket>> {
        self.ensure_ticket_tables().await?;

        let timer = QueryTimer::new("get_open_ticket");
        let result = self
            .conn
            .run(
                "get_open_ticket",
                StatementClass::Idempotent,
                move |conn| {
                    sqlx::query_as::<_, Ticket>(
                        r#"
                        SELECT id, user_id, channel_id, created_at, closed_at
                        FROM tickets
                        WHERE channel_id = $1 AND closed_at IS NULL
                        ORDER BY id DESC
                        LIMIT 1
                        "#,
                    )
                    .bind(channel_id)
                    .fetch_optional(conn)
                    .boxed()
                },
            )
            .await;
        timer.record();
        result
    }

    // =========================================================================
    // Audit log
    // =========================================================================

    /// Audit rows for a ticket, oldest first.
    pub async fn get_ticket_logs(&self, ticket_id: i64) -> StoreResult<Vec<TicketLog>> {
        self.ensure_ticket_tables().await?;

        let timer = QueryTimer::new("get_ticket_logs");
        let result = self
            .conn
            .run(
                "get_ticket_logs",
                StatementClass::Idempotent,
                move |conn| {
                    sqlx::query_as::<_, TicketLog>(
                        r#"
                        SELECT id, ticket_id, action, details, created_at
                        FROM ticket_logs
                        WHERE ticket_id = $1
                        ORDER BY id
                        "#,
                    )
                    .bind(ticket_id)
                    .fetch_all(conn)
                    .boxed()
                },
            )
            .await;
        timer.record();
        result
    }

    async fn append_ticket_log(
        &self,
        ticket_id: i64,
        action: TicketAction,
        details: Option<String>,
    ) -> StoreResult<()> {
        let timer = QueryTimer::new("append_ticket_log");
        let result = self
            .conn
            .run(
                "append_ticket_log",
                StatementClass::NonIdempotent,
                move |conn| {
                    sqlx::query(
                        "INSERT INTO ticket_logs (ticket_id, action, details) VALUES ($1, $2, $3)",
                    )
                    .bind(ticket_id)
                    .bind(action.as_str())
                    .bind(details.clone())
                    .execute(conn)
                    .boxed()
                },
            )
            .await;
        timer.record();
        result?;
        Ok(())
    }

    /// Re-ensures the ticket tables once per process. Stores provisioned by
    /// instances predating the ticket feature lack the pair.
    async fn ensure_ticket_tables(&self) -> StoreResult<()> {
        if self.ticket_tables_ready.load(Ordering::Acquire) {
            return Ok(());
        }
        schema::ensure_ticket_tables(&self.conn).await?;
        self.ticket_tables_ready.store(true, Ordering::Release);
        Ok(())
    }
}
