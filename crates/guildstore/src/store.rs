//! The store facade owning the connection and the cache slots.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::cache::TtlCell;
use crate::config::StoreConfig;
use crate::connection::ConnectionManager;
use crate::error::StoreResult;
use crate::retry::RetryPolicy;
use crate::schema;

/// Cache slots for the read-heavy collections. Balances, cooldowns, panels
/// and tickets are deliberately never cached; for those, correctness beats
/// staleness.
pub(crate) struct CollectionCaches {
    pub(crate) mod_roles: TtlCell<Vec<i64>>,
    pub(crate) jobs: TtlCell<HashMap<i64, i64>>,
    pub(crate) auto_responses: TtlCell<HashMap<String, String>>,
}

impl CollectionCaches {
    fn new(ttl: Duration) -> Self {
        Self {
            mod_roles: TtlCell::new("mod_roles", ttl),
            jobs: TtlCell::new("jobs", ttl),
            auto_responses: TtlCell::new("auto_responses", ttl),
        }
    }
}

/// Persistent state store for the bot.
///
/// Owns one logical database connection and the short-TTL read caches. The
/// typed operations live in the `ops` modules, grouped by entity.
pub struct Store {
    pub(crate) conn: ConnectionManager,
    pub(crate) caches: CollectionCaches,
    /// Flipped once the lazy re-ensure of the ticket tables ran. Stores
    /// provisioned by instances predating the ticket feature lack the pair.
    pub(crate) ticket_tables_ready: AtomicBool,
}

impl Store {
    /// Connects to the database service and provisions any missing tables.
    ///
    /// Connection failures are retried within the configured attempt count;
    /// exhaustion here is a startup-fatal error.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let policy = RetryPolicy::from(&config.retry);
        let conn = ConnectionManager::new(&config.database, policy);
        conn.connect().await?;

        let store = Self {
            conn,
            caches: CollectionCaches::new(Duration::from_secs(config.cache.ttl_secs)),
            ticket_tables_ready: AtomicBool::new(false),
        };
        schema::ensure_schema(&store.conn).await?;
        Ok(store)
    }

    /// Probes the connection and re-establishes it if the probe fails.
    pub async fn ensure_connection(&self) -> StoreResult<()> {
        self.conn.ensure_connection().await
    }
}
