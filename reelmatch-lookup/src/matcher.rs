//! Title matching against the review service
//!
//! A lookup normalizes the query title, spends one rate token on a search and
//! returns the first candidate (in the service's ranking order) whose title
//! and theatrical year both match.
//!
//! - `Exact`: normalized titles equal, years equal
//! - `Loose`: candidate title contains the query title, years within two

use crate::normalize::normalize;
use crate::{LookupError, MatchCandidate, SearchService, TokenBucket};
use reelmatch_common::config::MatchMode;
use reelmatch_common::db::get_title;
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Textual sentinel for "no year constraint"
const ANY_YEAR: &str = "any";

/// Year constraint of a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearQuery {
    Year(i32),
    /// Any theatrical year (or none at all) is accepted
    Any,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid year {0:?}: expected a number or \"any\"")]
pub struct ParseYearError(String);

impl FromStr for YearQuery {
    type Err = ParseYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(ANY_YEAR) {
            return Ok(YearQuery::Any);
        }
        s.parse()
            .map(YearQuery::Year)
            .map_err(|_| ParseYearError(s.to_string()))
    }
}

impl fmt::Display for YearQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearQuery::Year(year) => write!(f, "{}", year),
            YearQuery::Any => f.write_str(ANY_YEAR),
        }
    }
}

impl From<i32> for YearQuery {
    fn from(year: i32) -> Self {
        YearQuery::Year(year)
    }
}

impl MatchCandidate {
    /// Title predicate; `query` must already be normalized
    pub fn matches_title(&self, query: &str, mode: MatchMode) -> bool {
        let title = normalize(&self.title);
        match mode {
            MatchMode::Exact => title == query,
            MatchMode::Loose => title.contains(query),
        }
    }

    /// Year predicate
    ///
    /// A concrete year requires a theatrical release within the mode's
    /// tolerance; candidates without one never match.
    pub fn matches_year(&self, year: YearQuery, mode: MatchMode) -> bool {
        match year {
            YearQuery::Any => true,
            YearQuery::Year(query) => self
                .theater_year()
                .is_some_and(|year| year.abs_diff(query) <= mode.year_tolerance().unsigned_abs()),
        }
    }
}

/// First candidate passing both the title and the year predicate
pub fn select_candidate(
    candidates: Vec<MatchCandidate>,
    title: &str,
    year: YearQuery,
    mode: MatchMode,
) -> Option<MatchCandidate> {
    let query = normalize(title);
    candidates
        .into_iter()
        .find(|c| c.matches_title(&query, mode) && c.matches_year(year, mode))
}

/// Matches titles against a review service
///
/// The rate limiter is shared: clone the `Arc` to let several matchers (or
/// concurrent callers of one matcher) draw from the same bucket.
pub struct Matcher<S> {
    service: S,
    limiter: Arc<TokenBucket>,
    catalog: SqlitePool,
    mode: MatchMode,
}

impl<S: SearchService> Matcher<S> {
    pub fn new(service: S, limiter: Arc<TokenBucket>, catalog: SqlitePool, mode: MatchMode) -> Self {
        Self {
            service,
            limiter,
            catalog,
            mode,
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Match a free title
    pub async fn match_title(&self, title: &str, year: YearQuery) -> Result<MatchCandidate, LookupError> {
        if normalize(title).is_empty() {
            return Err(LookupError::NotFound(format!(
                "title {:?} has nothing to match on",
                title
            )));
        }

        let token = self.limiter.acquire().await?;
        let response = self.service.search(token, title).await?;
        let returned = response.movies.len();

        match select_candidate(response.movies, title, year, self.mode) {
            Some(candidate) => {
                info!(
                    title = %title,
                    year = %year,
                    matched_id = %candidate.id,
                    matched_title = %candidate.title,
                    "Match found"
                );
                Ok(candidate)
            }
            None => {
                debug!(title = %title, year = %year, returned, "No candidate matched");
                Err(LookupError::NotFound(format!("{} ({})", title, year)))
            }
        }
    }

    /// Match a title from the local catalog by id
    ///
    /// A title that cannot be read from the catalog, whether absent or not
    /// readable, is reported as not found.
    pub async fn match_catalog_id(&self, id: i64) -> Result<MatchCandidate, LookupError> {
        let title = match get_title(&self.catalog, id).await {
            Ok(Some(title)) => title,
            Ok(None) => {
                debug!(id, "Catalog title not found");
                return Err(LookupError::NotFound(format!("catalog title {}", id)));
            }
            Err(e) => {
                warn!(id, "Catalog lookup failed: {}", e);
                return Err(LookupError::NotFound(format!("catalog title {} ({})", id, e)));
            }
        };

        self.match_title(&title.title, YearQuery::Year(title.year))
            .await
    }
}
