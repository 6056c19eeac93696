//! Error types for review lookups

use thiserror::Error;

/// Lookup errors
///
/// `NotFound` is an expected outcome reported to the caller; every other
/// variant is a failure of the lookup itself.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No local title with the id, or no candidate passed the filters
    #[error("No match found: {0}")]
    NotFound(String),

    /// The request could not be sent or its body could not be read
    #[error("Lookup request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Lookup service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body was not a valid search result
    #[error("Failed to parse lookup response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The rate limiter was shut down while waiting for a token
    #[error("Rate limiter closed")]
    RateLimiterClosed,

    #[error(transparent)]
    Common(#[from] reelmatch_common::Error),
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound(_))
    }
}
