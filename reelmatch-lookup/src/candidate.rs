//! Review service response types
//!
//! Every field defaults when absent from the JSON; the service omits keys
//! freely (no consensus yet, no theatrical release date, ...).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Release date kind carrying the theatrical release
pub const THEATER_RELEASE: &str = "theater";

/// Search response envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub total: u64,
    pub movies: Vec<MatchCandidate>,
}

/// One search result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchCandidate {
    pub id: String,
    pub title: String,
    /// Release date kind (`theater`, `dvd`, ...) to `YYYY-MM-DD`
    pub release_dates: HashMap<String, String>,
    pub critics_consensus: String,
    pub ratings: Ratings,
    /// Relation name (`self`, `alternate`, `reviews`, ...) to URL
    pub links: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ratings {
    pub critics_rating: String,
    pub critics_score: i32,
    pub audience_rating: String,
    pub audience_score: i32,
}

impl MatchCandidate {
    /// Year of the theatrical release
    ///
    /// `None` when there is no theatrical date, the date has no `-`, or the
    /// part before the first `-` is not a number.
    pub fn theater_year(&self) -> Option<i32> {
        let date = self.release_dates.get(THEATER_RELEASE)?;
        let (year, _) = date.split_once('-')?;
        year.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_release(kind: &str, date: &str) -> MatchCandidate {
        MatchCandidate {
            release_dates: HashMap::from([(kind.to_string(), date.to_string())]),
            ..MatchCandidate::default()
        }
    }

    #[test]
    fn test_theater_year() {
        assert_eq!(with_release("theater", "1988-07-20").theater_year(), Some(1988));
        assert_eq!(with_release("theater", "1988-").theater_year(), Some(1988));
        assert_eq!(with_release("theater", "1988").theater_year(), None);
        assert_eq!(with_release("theater", "soon-ish").theater_year(), None);
        assert_eq!(with_release("dvd", "1989-01-10").theater_year(), None);
        assert_eq!(MatchCandidate::default().theater_year(), None);
    }

    #[test]
    fn test_decode_partial_response() {
        let json = r#"{
            "total": 1,
            "movies": [{
                "id": "12345",
                "title": "Die Hard",
                "year": 1988,
                "release_dates": {"theater": "1988-07-20", "dvd": "2001-03-06"},
                "ratings": {"critics_rating": "Certified Fresh", "critics_score": 93},
                "links": {"self": "http://api/movies/12345.json"}
            }],
            "link_template": "http://api/movies.json?q={search-term}"
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total, 1);

        let movie = &response.movies[0];
        assert_eq!(movie.id, "12345");
        assert_eq!(movie.critics_consensus, "");
        assert_eq!(movie.ratings.critics_score, 93);
        assert_eq!(movie.ratings.audience_rating, "");
        assert_eq!(movie.ratings.audience_score, 0);
        assert_eq!(movie.theater_year(), Some(1988));
    }
}
