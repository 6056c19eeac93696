//! Error types for reelmatch-ingest
//!
//! Per-element problems (an unparsable year, a bad attribute) never surface
//! here: the decoder logs them and skips the element. Every variant below
//! ends the ingestion run.

use thiserror::Error;

/// Fatal ingestion error
#[derive(Debug, Error)]
pub enum IngestError {
    /// Title identifier does not have the assumed `.../<kind>/<id>` shape
    ///
    /// The feed is assumed well-formed; this means it no longer matches that
    /// assumption and ingestion must not continue.
    #[error("Malformed title identifier {id:?}: {reason}")]
    MalformedIdentifier { id: String, reason: String },

    /// Token stream could not be read
    #[error("Feed XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Feed ended in the middle of a title element
    #[error("Feed truncated inside a <catalog_title> element")]
    TruncatedFeed,

    /// Writer could not open its store session
    #[error("Writer {writer} failed to open a store session: {source}")]
    OpenWriter {
        writer: usize,
        #[source]
        source: reelmatch_common::Error,
    },

    /// Insert failed; partial ingestion cannot be safely continued
    #[error("Writer {writer} failed to store title {title_id}: {source}")]
    Storage {
        writer: usize,
        title_id: i64,
        #[source]
        source: reelmatch_common::Error,
    },

    /// Remote feed request failed
    #[error("Feed request failed: {0}")]
    Source(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Run was cancelled after a fatal error elsewhere
    #[error("Ingestion cancelled")]
    Cancelled,

    /// Writer task panicked or was aborted
    #[error("Writer task failed: {0}")]
    WriterTask(#[from] tokio::task::JoinError),

    /// Configuration or database setup error
    #[error(transparent)]
    Common(#[from] reelmatch_common::Error),
}

impl IngestError {
    /// True when the feed violated its structural contract
    pub fn is_fatal_precondition(&self) -> bool {
        matches!(
            self,
            IngestError::MalformedIdentifier { .. } | IngestError::TruncatedFeed
        )
    }
}
