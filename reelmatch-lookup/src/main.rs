//! reelmatch-lookup - Catalog search and review matching
//!
//! `search` queries the local catalog; `match` cross-references a catalog
//! title (or a free title) against the external review service and prints
//! the matched candidate as JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use reelmatch_common::config::{load_config, resolve_api_key, resolve_database_path};
use reelmatch_common::db::{init_database_pool, search_titles};
use reelmatch_lookup::{Matcher, ReviewClient, TokenBucket, YearQuery};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit code reported when no match exists
const EXIT_NOT_FOUND: u8 = 2;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "reelmatch-lookup")]
#[command(about = "Search the local catalog and match titles against review data")]
#[command(version)]
struct Cli {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Review service API key
    #[arg(long)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search catalog titles, best rated first
    Search {
        /// Title or part of a title
        term: String,

        /// Only titles named exactly `term` released in this year
        #[arg(long)]
        year: Option<i32>,
    },
    /// Find review data for a title
    Match(MatchArgs),
}

#[derive(Args, Debug)]
struct MatchArgs {
    /// Catalog title id
    #[arg(long, conflicts_with = "title", required_unless_present = "title")]
    id: Option<i64>,

    /// Free title
    #[arg(long)]
    title: Option<String>,

    /// Release year of a free title, or "any" (default)
    #[arg(long, requires = "title")]
    year: Option<YearQuery>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting reelmatch-lookup v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db_path = resolve_database_path(cli.database.as_deref(), &config);
    info!("Database path: {}", db_path.display());
    let pool = init_database_pool(&db_path, 2)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match cli.command {
        Command::Search { term, year } => {
            let titles = search_titles(&pool, &term, year).await?;
            info!("{} titles found", titles.len());
            println!("{}", serde_json::to_string_pretty(&titles)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Match(args) => {
            let api_key = resolve_api_key(cli.api_key.as_deref(), &config);
            let client = ReviewClient::new(&config.lookup, api_key)?;
            let limiter = Arc::new(TokenBucket::new(
                config.lookup.rate_per_second,
                config.lookup.burst,
            ));
            let matcher = Matcher::new(client, Arc::clone(&limiter), pool, config.lookup.mode);

            let result = match args.id {
                Some(id) => matcher.match_catalog_id(id).await,
                None => {
                    let title = args.title.unwrap_or_default();
                    let year = args.year.unwrap_or(YearQuery::Any);
                    matcher.match_title(&title, year).await
                }
            };
            limiter.shutdown();

            match result {
                Ok(candidate) => {
                    println!("{}", serde_json::to_string_pretty(&candidate)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) if e.is_not_found() => {
                    eprintln!("{}", e);
                    Ok(ExitCode::from(EXIT_NOT_FOUND))
                }
                Err(e) => {
                    error!("Lookup failed: {}", e);
                    Err(e.into())
                }
            }
        }
    }
}
