//! Persistent state store for a guild moderation and utility bot.
//!
//! This crate contains:
//! - Connection lifecycle against the hosted database service, behind a
//!   bounded fixed-delay retry policy
//! - A short-TTL read cache for the slowly-changing collections
//!   (moderator roles, jobs, auto-responses), invalidated by writes
//! - Typed operations over balances, moderator roles, ticket panels,
//!   auto-responses, daily cooldowns, jobs and tickets
//!
//! The chat-platform client and the command handlers live in the embedding
//! application; this crate only ever sees primitive identifiers and row
//! types.

pub mod cache;
pub mod config;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod store;

mod connection;
mod ops;
mod schema;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use store::Store;
