//! Admin command line for the bot state store.
//!
//! `provision` connects and creates any missing tables; `check` verifies
//! connectivity against a running deployment. Both read the same
//! configuration as the bot (GUILDSTORE__ environment variables, optional
//! config/guildstore.toml).

use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use guildstore::config::LoggingConfig;
use guildstore::{Store, StoreConfig};

#[derive(Parser)]
#[command(name = "guildstore-cli", version, about = "Admin tooling for the bot state store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect and create any missing tables.
    Provision,
    /// Probe connectivity and report round-trip latency.
    Check,
}

/// Directives used when RUST_LOG is unset: the workspace crates at the
/// configured level, dependencies silent.
fn default_filter(level: &str) -> String {
    format!("guildstore={level},guildstore_cli={level}")
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.level)));
    let registry = tracing_subscriber::registry().with(filter);

    // A one-shot command has no long-lived spans worth timing, so both
    // formats stay event-only.
    if config.format == "json" {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = StoreConfig::load()?;
    init_logging(&config.logging);

    info!("guildstore-cli v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Provision => {
            let _store = Store::connect(&config).await?;
            info!("schema provisioned");
        }
        Command::Check => {
            let store = Store::connect(&config).await?;
            let started = Instant::now();
            store.ensure_connection().await?;
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "connection ok"
            );
        }
    }

    Ok(())
}
