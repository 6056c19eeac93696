//! The `titles` catalog table

use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};

const INSERT_TITLE: &str = "INSERT INTO titles (id, year, title, updated, rating, play_url, synopsis, box_art) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?)";

/// One ingested catalog title, in the shape it is persisted
///
/// Written once and never updated by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTitleRecord {
    pub id: i64,
    pub year: i32,
    pub title: String,
    pub updated: i64,
    pub rating: f32,
    pub play_url: String,
    pub synopsis: String,
    pub box_art: String,
}

/// Catalog title as read back for search and matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogTitle {
    pub id: i64,
    pub title: String,
    pub year: i32,
    #[serde(rename = "url")]
    pub play_url: String,
    pub rating: f32,
    pub synopsis: String,
    pub box_art: String,
}

/// Insert one record
///
/// The statement is prepared once per connection and cached by sqlx, so a
/// writer holding a single connection reuses the same prepared insert.
pub async fn insert_title<'e, E>(executor: E, record: &StoredTitleRecord) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(INSERT_TITLE)
        .bind(record.id)
        .bind(record.year)
        .bind(&record.title)
        .bind(record.updated)
        .bind(record.rating)
        .bind(&record.play_url)
        .bind(&record.synopsis)
        .bind(&record.box_art)
        .execute(executor)
        .await?;
    Ok(())
}

/// Get a catalog title by id
pub async fn get_title(pool: &SqlitePool, id: i64) -> Result<Option<CatalogTitle>> {
    let title = sqlx::query_as::<_, CatalogTitle>(
        "SELECT id, title, year, play_url, rating, synopsis, box_art FROM titles WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(title)
}

/// Search the catalog by title
///
/// Without a year the term matches anywhere in the title; with a year the
/// whole title must match (case-insensitively) and the year must be equal.
/// Results are ordered by rating, best first.
pub async fn search_titles(
    pool: &SqlitePool,
    term: &str,
    year: Option<i32>,
) -> Result<Vec<CatalogTitle>> {
    let escaped = escape_like(term.trim());

    let titles = match year {
        Some(year) => {
            sqlx::query_as::<_, CatalogTitle>(
                "SELECT id, title, year, play_url, rating, synopsis, box_art FROM titles \
                 WHERE title LIKE ? ESCAPE '\\' AND year = ? ORDER BY rating DESC",
            )
            .bind(escaped)
            .bind(year)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, CatalogTitle>(
                "SELECT id, title, year, play_url, rating, synopsis, box_art FROM titles \
                 WHERE title LIKE ? ESCAPE '\\' ORDER BY rating DESC",
            )
            .bind(format!("%{}%", escaped))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(titles)
}

/// Escape LIKE wildcards so the term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
