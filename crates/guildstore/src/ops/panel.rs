//! Ticket panel operations.
//!
//! Panels are append-only: every update inserts a new revision and the
//! newest row wins. Reads on an empty table serve the built-in default
//! panel.

use futures::FutureExt;

use crate::entities::{PanelColor, TicketPanel};
use crate::error::StoreResult;
use crate::metrics::QueryTimer;
use crate::retry::StatementClass;
use crate::store::Store;

impl Store {
    /// The current panel: the newest stored revision, or the built-in
    /// default when none has been stored yet.
    pub async fn get_ticket_panel(&self) -> StoreResult<TicketPanel> {
        let timer = QueryTimer::new("get_ticket_panel");
        let result = self
            .conn
            .run("get_ticket_panel", StatementClass::Idempotent, |conn| {
                sqlx::query_as::<_, TicketPanel>(
                    r#"
                    SELECT id, title, description, color
                    FROM ticket_panel
                    ORDER BY id DESC
                    LIMIT 1
                    "#,
                )
                .fetch_optional(conn)
                .boxed()
            })
            .await;
        timer.record();
        Ok(result?.unwrap_or_else(TicketPanel::default_panel))
    }

    /// A specific stored panel revision, if it exists.
    pub async fn get_ticket_panel_by_id(&self, id: i64) -> StoreResult<Option<TicketPanel>> {
        let timer = QueryTimer::new("get_ticket_panel_by_id");
        let result = self
            .conn
            .run(
                "get_ticket_panel_by_id",
                StatementClass::Idempotent,
                move |conn| {
                    sqlx::query_as::<_, TicketPanel>(
                        "SELECT id, title, description, color FROM ticket_panel WHERE id = $1",
                    )
                    .bind(id)
                    .fetch_optional(conn)
                    .boxed()
                },
            )
            .await;
        timer.record();
        result
    }

    /// Stores a new panel revision and returns its id.
    pub async fn set_ticket_panel(
        &self,
        title: &str,
        description: &str,
        color: PanelColor,
    ) -> StoreResult<i64> {
        let title = title.to_owned();
        let description = description.to_owned();

        let timer = QueryTimer::new("set_ticket_panel");
        let result = self
            .conn
            .run(
                "set_ticket_panel",
                StatementClass::NonIdempotent,
                move |conn| {
                    sqlx::query_scalar::<_, i64>(
                        r#"
                        INSERT INTO ticket_panel (title, description, color)
                        VALUES ($1, $2, $3)
                        RETURNING id
                        "#,
                    )
                    .bind(title.clone())
                    .bind(description.clone())
                    .bind(color.as_str())
                    .fetch_one(conn)
                    .boxed()
                },
            )
            .await;
        timer.record();
        result
    }
}
