//! Ticket and ticket log entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the tickets table.
#[derive(Debug, Clone, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub user_id: i64,
    pub channel_id: i64,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// Audit actions recorded in the ticket_logs table, stored as lowercase
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    Created,
    Closed,
}

impl TicketAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketAction::Created => "created",
            TicketAction::Closed => "closed",
        }
    }
}

/// Database row mapping for the ticket_logs table. Append-only.
#[derive(Debug, Clone, FromRow)]
pub struct TicketLog {
    pub id: i64,
    pub ticket_id: i64,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}
