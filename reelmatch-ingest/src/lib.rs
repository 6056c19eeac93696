//! reelmatch-ingest library interface
//!
//! Streams the catalog feed, extracts one record per movie title and fans the
//! records out to a fixed pool of database writers through a bounded queue.

pub mod error;
pub mod feed;
pub mod pipeline;
pub mod source;
pub mod writer;

pub use crate::error::IngestError;
pub use crate::pipeline::{run_ingest, IngestOptions, IngestSummary};
