//! reelmatch-lookup library interface
//!
//! Cross-references catalog titles against an external review service:
//! titles are normalized, searched through a rate-limited client and the
//! returned candidates filtered by title and theatrical year.

pub mod candidate;
pub mod client;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod rate_limiter;

pub use crate::candidate::{MatchCandidate, Ratings, SearchResponse};
pub use crate::client::{ReviewClient, SearchService};
pub use crate::error::LookupError;
pub use crate::matcher::{select_candidate, Matcher, YearQuery};
pub use crate::rate_limiter::{RateToken, TokenBucket};
