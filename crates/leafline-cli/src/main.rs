//! # leafline
//!
//! Operator binary for the Leafline interaction ledger.
//!
//! Opens the SQLite store, normalizes it against the book catalog, then runs
//! one command: print statistics, recent activity or comments, toggle an
//! interaction, export or import the user's data, or reset everything.

mod catalog;
mod commands;
mod config;

use std::sync::Arc;

use clap::{CommandFactory, Parser};
use leafline_ledger::InteractionLedger;
use leafline_store::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;
use crate::config::CliConfig;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so that `export` output can be piped.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,leafline=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = Cli::parse().command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = CliConfig::from_env();
    info!(?config, "Loaded configuration");

    let db = match &config.db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    info!(path = ?db.path(), "store opened");
    let registry = catalog::load(config.catalog_path.as_deref())?;
    info!(books = registry.len(), "catalog ready");

    let mut ledger = InteractionLedger::open(db, Arc::new(registry), config.ledger);
    commands::execute(&mut ledger, command, &mut std::io::stdout().lock())?;

    let pending = ledger.store().unpersisted_tables();
    if !pending.is_empty() {
        tracing::warn!(?pending, "some changes could not be saved and will be lost on exit");
    }

    Ok(())
}
