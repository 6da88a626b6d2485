//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod panel;
pub mod ticket;

pub use panel::{PanelColor, TicketPanel, DEFAULT_PANEL_DESCRIPTION, DEFAULT_PANEL_TITLE};
pub use ticket::{Ticket, TicketAction, TicketLog};
