//! Database access for reelmatch
//!
//! Shared SQLite database holding the ingested `titles` catalog.

mod titles;

pub use titles::{get_title, insert_title, search_titles, CatalogTitle, StoredTitleRecord};

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// How long a connection waits on a locked database before failing
///
/// Concurrent writers serialize on SQLite's write lock; this bounds the wait.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Initialize database connection pool
///
/// Creates the file (and parent directory) if missing and makes sure the
/// `titles` table exists. `max_connections` must cover every writer that
/// holds a connection for its lifetime, plus one for ad-hoc queries.
pub async fn init_database_pool(db_path: &Path, max_connections: u32) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    tracing::debug!("Connecting to database: {}", db_path.display());

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the `titles` table if it doesn't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS titles (
            id INTEGER PRIMARY KEY,
            year INTEGER NOT NULL,
            title TEXT NOT NULL,
            updated INTEGER NOT NULL,
            rating REAL NOT NULL,
            play_url TEXT NOT NULL,
            synopsis TEXT NOT NULL DEFAULT '',
            box_art TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (titles)");

    Ok(())
}
