//! Integration tests against a live PostgreSQL instance.
//!
//! These are ignored by default. To run them, provision a throwaway
//! database and set the credentials:
//!
//! ```text
//! export TEST_DATABASE_API_KEY=guildstore
//! export TEST_DATABASE_NAME=guildstore_test   # HOST/PORT/USER/NAME are
//!                                             # optional, defaults below
//! cargo test -p guildstore --test live -- --ignored
//! ```
//!
//! Identifiers are generated per run, so the suite tolerates leftover rows
//! from earlier runs.

use std::time::{SystemTime, UNIX_EPOCH};

use guildstore::config::{DatabaseConfig, StoreConfig};
use guildstore::entities::PanelColor;
use guildstore::Store;

fn live_config() -> Option<StoreConfig> {
    let api_key = std::env::var("TEST_DATABASE_API_KEY").ok()?;
    let defaults = DatabaseConfig::default();

    let database = DatabaseConfig {
        api_key,
        name: std::env::var("TEST_DATABASE_NAME")
            .unwrap_or_else(|_| "guildstore_test".to_string()),
        host: std::env::var("TEST_DATABASE_HOST").unwrap_or(defaults.host),
        user: std::env::var("TEST_DATABASE_USER").unwrap_or(defaults.user),
        port: std::env::var("TEST_DATABASE_PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(defaults.port),
    };

    Some(StoreConfig {
        database,
        ..StoreConfig::default()
    })
}

async fn live_store() -> Option<Store> {
    let config = live_config()?;
    Some(Store::connect(&config).await.expect("connect to test database"))
}

/// Snowflake-shaped id unique to this call, so runs do not collide.
fn unique_id() -> i64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    (nanos as i64) & i64::MAX
}

macro_rules! require_store {
    () => {
        match live_store().await {
            Some(store) => store,
            None => {
                eprintln!("skipping: TEST_DATABASE_API_KEY not set");
                return;
            }
        }
    };
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL instance via TEST_DATABASE_*"]
async fn balance_defaults_to_zero_and_set_overwrites() {
    let store = require_store!();
    let user = unique_id();

    assert_eq!(store.get_balance(user).await.unwrap(), 0);

    store.set_balance(user, 250).await.unwrap();
    assert_eq!(store.get_balance(user).await.unwrap(), 250);

    // set is an absolute overwrite, not additive
    store.set_balance(user, 250).await.unwrap();
    assert_eq!(store.get_balance(user).await.unwrap(), 250);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL instance via TEST_DATABASE_*"]
async fn balance_arithmetic_clamps_at_zero() {
    let store = require_store!();
    let user = unique_id();

    assert_eq!(store.add_balance(user, 100).await.unwrap(), 100);
    assert_eq!(store.add_balance(user, 50).await.unwrap(), 150);
    assert_eq!(store.remove_balance(user, 40).await.unwrap(), 110);
    assert_eq!(store.remove_balance(user, 1_000).await.unwrap(), 0);

    // removing from a user with no row leaves them at zero
    let fresh = unique_id();
    assert_eq!(store.remove_balance(fresh, 10).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL instance via TEST_DATABASE_*"]
async fn mod_role_grant_is_idempotent_and_revoke_tolerates_absence() {
    let store = require_store!();
    let role = unique_id();

    store.add_mod_role(role).await.unwrap();
    store.add_mod_role(role).await.unwrap();

    let roles = store.get_mod_roles().await;
    assert_eq!(roles.iter().filter(|&&r| r == role).count(), 1);

    assert!(store.remove_mod_role(role).await.unwrap());
    assert!(!store.remove_mod_role(role).await.unwrap());
    assert!(!store.get_mod_roles().await.contains(&role));
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL instance via TEST_DATABASE_*"]
async fn auto_response_write_invalidates_cache_inside_ttl() {
    let store = require_store!();
    let trigger = format!("trigger-{}", unique_id());

    // Populate the cache first so the write lands inside a fresh window
    let before = store.get_auto_responses().await;
    assert!(!before.contains_key(&trigger));

    store.add_auto_response(&trigger, "hello there").await.unwrap();

    let after = store.get_auto_responses().await;
    assert_eq!(after.get(&trigger).map(String::as_str), Some("hello there"));

    // Upsert replaces, last write wins
    store.add_auto_response(&trigger, "general kenobi").await.unwrap();
    let replaced = store.get_auto_responses().await;
    assert_eq!(
        replaced.get(&trigger).map(String::as_str),
        Some("general kenobi")
    );

    assert!(store.remove_auto_response(&trigger).await.unwrap());
    assert!(!store.get_auto_responses().await.contains_key(&trigger));
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL instance via TEST_DATABASE_*"]
async fn job_upsert_and_removal() {
    let store = require_store!();
    let role = unique_id();

    store.add_job(role, 500).await.unwrap();
    store.add_job(role, 750).await.unwrap();
    assert_eq!(store.get_jobs().await.get(&role), Some(&750));

    assert!(store.remove_job(role).await.unwrap());
    assert!(!store.remove_job(role).await.unwrap());
    assert!(!store.get_jobs().await.contains_key(&role));
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL instance via TEST_DATABASE_*"]
async fn daily_claim_blocks_until_interval_passes() {
    let store = require_store!();
    let user = unique_id();

    assert!(store.can_claim_daily(user).await.unwrap());
    store.set_daily_claimed(user).await.unwrap();
    assert!(!store.can_claim_daily(user).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL instance via TEST_DATABASE_*"]
async fn ticket_lifecycle_is_append_only() {
    let store = require_store!();
    let user = unique_id();
    let channel = unique_id();

    let ticket_id = store.create_ticket(user, channel).await.unwrap();

    let open = store.get_open_ticket(channel).await.unwrap().expect("open ticket");
    assert_eq!(open.id, ticket_id);
    assert_eq!(open.user_id, user);
    assert!(open.is_open());

    assert_eq!(store.close_ticket(channel).await.unwrap(), Some(ticket_id));
    assert!(store.get_open_ticket(channel).await.unwrap().is_none());

    // closing again is a no-op, the closed row is never reopened or cloned
    assert_eq!(store.close_ticket(channel).await.unwrap(), None);

    let logs = store.get_ticket_logs(ticket_id).await.unwrap();
    let actions: Vec<&str> = logs.iter().map(|l| l.action.as_str()).collect();
    assert_eq!(actions, vec!["created", "closed"]);

    // the creation row names the opening user; closing records no extra detail
    assert_eq!(logs[0].details, Some(format!("opened by user {user}")));
    assert_eq!(logs[1].details, None);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL instance via TEST_DATABASE_*"]
async fn panel_revisions_append_and_missing_id_reads_none() {
    let store = require_store!();
    let title = format!("Panel {}", unique_id());

    let id = store
        .set_ticket_panel(&title, "Open a ticket below.", PanelColor::Gold)
        .await
        .unwrap();
    assert!(id > 0);

    let current = store.get_ticket_panel().await.unwrap();
    assert_eq!(current.id, id);
    assert_eq!(current.title, title);
    assert_eq!(current.panel_color(), PanelColor::Gold);

    let by_id = store.get_ticket_panel_by_id(id).await.unwrap().expect("revision");
    assert_eq!(by_id.title, title);

    // id 0 is reserved for the built-in default and never stored
    assert!(store.get_ticket_panel_by_id(0).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL instance via TEST_DATABASE_*"]
async fn ensure_connection_probe_succeeds() {
    let store = require_store!();
    store.ensure_connection().await.unwrap();
}
