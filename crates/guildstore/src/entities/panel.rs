//! Ticket panel entity (database row mapping) and its color palette.

use std::fmt;
use std::str::FromStr;

use sqlx::FromRow;
use tracing::warn;

use crate::error::StoreError;

/// Title served when no panel row has been stored yet.
pub const DEFAULT_PANEL_TITLE: &str = "Support Ticket System";

/// Description served when no panel row has been stored yet.
pub const DEFAULT_PANEL_DESCRIPTION: &str =
    "Click the button below to create a new support ticket. A moderator will assist you shortly.";

/// Embed colors a panel can be styled with.
///
/// Stored lowercase in the `color` column. Parsing handler input rejects
/// unknown names; reading stored values never fails and degrades to blue,
/// since cosmetic data must not break a panel read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanelColor {
    #[default]
    Blue,
    Green,
    Red,
    Orange,
    Purple,
    Gold,
}

impl PanelColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelColor::Blue => "blue",
            PanelColor::Green => "green",
            PanelColor::Red => "red",
            PanelColor::Orange => "orange",
            PanelColor::Purple => "purple",
            PanelColor::Gold => "gold",
        }
    }

    /// Lenient parse for values read back from the store.
    pub fn from_db(value: &str) -> Self {
        match value.parse() {
            Ok(color) => color,
            Err(_) => {
                warn!(value, "unknown stored panel color, using blue");
                PanelColor::Blue
            }
        }
    }
}

impl fmt::Display for PanelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelColor {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blue" => Ok(PanelColor::Blue),
            "green" => Ok(PanelColor::Green),
            "red" => Ok(PanelColor::Red),
            "orange" => Ok(PanelColor::Orange),
            "purple" => Ok(PanelColor::Purple),
            "gold" => Ok(PanelColor::Gold),
            other => Err(StoreError::Validation(format!(
                "unknown panel color: {other}"
            ))),
        }
    }
}

/// Database row mapping for the ticket_panel table.
///
/// Panels are append-only; the row with the highest id is the current one.
#[derive(Debug, Clone, FromRow)]
pub struct TicketPanel {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub color: String,
}

impl TicketPanel {
    /// The built-in panel served before any row has been stored. Its id is
    /// 0, which never collides with a stored row.
    pub fn default_panel() -> Self {
        Self {
            id: 0,
            title: DEFAULT_PANEL_TITLE.to_string(),
            description: DEFAULT_PANEL_DESCRIPTION.to_string(),
            color: PanelColor::Blue.as_str().to_string(),
        }
    }

    /// Stored color parsed leniently.
    pub fn panel_color(&self) -> PanelColor {
        PanelColor::from_db(&self.color)
    }
}
