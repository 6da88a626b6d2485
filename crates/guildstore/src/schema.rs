//! Idempotent table provisioning.
//!
//! Tables are created with `CREATE TABLE IF NOT EXISTS` so a store
//! provisioned by an older process instance keeps working. Table and column
//! names are the wire format the deployed bot already uses and must not
//! change.

use futures::FutureExt;
use tracing::debug;

use crate::connection::ConnectionManager;
use crate::error::StoreResult;
use crate::retry::StatementClass;

const CREATE_ECONOMY: &str = r#"
CREATE TABLE IF NOT EXISTS economy (
    user_id BIGINT PRIMARY KEY,
    balance BIGINT NOT NULL DEFAULT 0
)
"#;

const CREATE_MOD_ROLES: &str = r#"
CREATE TABLE IF NOT EXISTS mod_roles (
    role_id BIGINT PRIMARY KEY
)
"#;

const CREATE_TICKET_PANEL: &str = r#"
CREATE TABLE IF NOT EXISTS ticket_panel (
    id BIGSERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    color TEXT NOT NULL DEFAULT 'blue'
)
"#;

const CREATE_AUTO_RESPONDER: &str = r#"
CREATE TABLE IF NOT EXISTS auto_responder (
    trigger TEXT PRIMARY KEY,
    response TEXT NOT NULL
)
"#;

const CREATE_DAILY_COOLDOWN: &str = r#"
CREATE TABLE IF NOT EXISTS daily_cooldown (
    user_id BIGINT PRIMARY KEY,
    last_claim TIMESTAMPTZ NOT NULL
)
"#;

const CREATE_JOBS: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    role_id BIGINT PRIMARY KEY,
    salary BIGINT NOT NULL
)
"#;

const CREATE_TICKETS: &str = r#"
CREATE TABLE IF NOT EXISTS tickets (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL,
    channel_id BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    closed_at TIMESTAMPTZ
)
"#;

const CREATE_TICKET_LOGS: &str = r#"
CREATE TABLE IF NOT EXISTS ticket_logs (
    id BIGSERIAL PRIMARY KEY,
    ticket_id BIGINT NOT NULL REFERENCES tickets (id),
    action TEXT NOT NULL,
    details TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CORE_TABLES: &[(&str, &str)] = &[
    ("economy", CREATE_ECONOMY),
    ("mod_roles", CREATE_MOD_ROLES),
    ("ticket_panel", CREATE_TICKET_PANEL),
    ("auto_responder", CREATE_AUTO_RESPONDER),
    ("daily_cooldown", CREATE_DAILY_COOLDOWN),
    ("jobs", CREATE_JOBS),
];

// The ticket pair arrived after the first deployments, so it is also
// re-ensured lazily before the first ticket operation of the process.
const TICKET_TABLES: &[(&str, &str)] = &[
    ("tickets", CREATE_TICKETS),
    ("ticket_logs", CREATE_TICKET_LOGS),
];

pub(crate) async fn ensure_schema(conn: &ConnectionManager) -> StoreResult<()> {
    for &(table, ddl) in CORE_TABLES.iter().chain(TICKET_TABLES) {
        ensure_table(conn, table, ddl).await?;
    }
    Ok(())
}

pub(crate) async fn ensure_ticket_tables(conn: &ConnectionManager) -> StoreResult<()> {
    for &(table, ddl) in TICKET_TABLES {
        ensure_table(conn, table, ddl).await?;
    }
    Ok(())
}

async fn ensure_table(conn: &ConnectionManager, table: &str, ddl: &'static str) -> StoreResult<()> {
    conn.run("ensure_schema", StatementClass::Idempotent, move |c| {
        sqlx::query(ddl).execute(c).boxed()
    })
    .await?;
    debug!(table, "table ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tables_create_idempotently() {
        for &(table, ddl) in CORE_TABLES.iter().chain(TICKET_TABLES) {
            assert!(
                ddl.contains("CREATE TABLE IF NOT EXISTS"),
                "{table} is not created idempotently"
            );
            assert!(ddl.contains(table));
        }
    }

    #[test]
    fn test_table_inventory() {
        assert_eq!(CORE_TABLES.len(), 6);
        assert_eq!(TICKET_TABLES.len(), 2);
    }

    #[test]
    fn test_ticket_logs_reference_tickets() {
        assert!(CREATE_TICKET_LOGS.contains("REFERENCES tickets (id)"));
    }
}
