//! reelmatch-ingest - Catalog feed ingestion
//!
//! Reads the streaming catalog (local file or remote endpoint) and stores one
//! row per playable movie in the local SQLite database.

use anyhow::{Context, Result};
use clap::Parser;
use reelmatch_common::config::{load_config, resolve_database_path, resolve_fetch};
use reelmatch_common::db::init_database_pool;
use reelmatch_ingest::source::FeedSource;
use reelmatch_ingest::writer::SqliteTitleStore;
use reelmatch_ingest::{run_ingest, IngestOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "reelmatch-ingest")]
#[command(about = "Ingest the streaming catalog into the local title database")]
#[command(version)]
struct Cli {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Fetch the catalog from the remote endpoint
    #[arg(long, conflicts_with = "file")]
    fetch: bool,

    /// Read the catalog from a local file
    #[arg(long)]
    file: Option<PathBuf>,

    /// Number of concurrent database writers
    #[arg(short, long)]
    writers: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting reelmatch-ingest v{}",
        env!("CARGO_PKG_VERSION")
    );

    let fetch_arg = if cli.fetch {
        Some(true)
    } else if cli.file.is_some() {
        Some(false)
    } else {
        None
    };
    let fetch = resolve_fetch(fetch_arg, &config);

    if let Some(path) = cli.file {
        config.feed.path = path;
    }
    if let Some(writers) = cli.writers {
        config.feed.writers = writers;
    }

    let source = FeedSource::from_config(&config.feed, fetch)?;
    let options = IngestOptions::from_config(&config.feed);

    let db_path = resolve_database_path(cli.database.as_deref(), &config);
    info!("Database path: {}", db_path.display());

    // One connection per writer plus one spare
    let pool = init_database_pool(&db_path, options.writers as u32 + 1)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let reader = source.open().await?;
    let store = Arc::new(SqliteTitleStore::new(pool.clone()));

    let result = run_ingest(reader, store, &options).await;
    pool.close().await;

    match result {
        Ok(summary) => {
            info!(
                decoded = summary.decode.decoded,
                written = summary.written,
                invalid = summary.decode.invalid,
                non_movie = summary.decode.non_movie,
                unplayable = summary.decode.unplayable,
                "✓ Catalog ingested"
            );
            Ok(())
        }
        Err(e) => {
            error!("Ingestion failed: {}", e);
            Err(e.into())
        }
    }
}
