//! Ingestion run
//!
//! Decoder → bounded queue → writer pool → store. Writers are started before
//! decoding begins; the run ends once the decoder has finished and every
//! writer has drained the queue and exited.

use crate::feed::{decode_feed, DecodeStats};
use crate::writer::{TitleStore, WriterPool};
use crate::IngestError;
use reelmatch_common::config::FeedConfig;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Writer pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    pub writers: usize,
    pub queue_capacity: usize,
}

impl IngestOptions {
    pub fn from_config(feed: &FeedConfig) -> Self {
        Self {
            writers: feed.writer_count(),
            queue_capacity: feed.queue_capacity(),
        }
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from_config(&FeedConfig::default())
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub decode: DecodeStats,
    pub written: u64,
}

/// Ingest one feed into `store`
///
/// Any fatal error (malformed identifier, broken token stream, failed insert)
/// cancels the whole run: the decoder stops producing and every writer stops
/// after its current record. The error that caused the cancellation is
/// returned.
pub async fn run_ingest<R, S>(
    source: R,
    store: Arc<S>,
    options: &IngestOptions,
) -> Result<IngestSummary, IngestError>
where
    R: AsyncBufRead + Unpin,
    S: TitleStore,
{
    let cancel = CancellationToken::new();
    let (queue_tx, queue_rx) = mpsc::channel(options.queue_capacity.max(1));

    info!(
        writers = options.writers,
        queue_capacity = options.queue_capacity,
        "Starting ingestion"
    );
    let writers = WriterPool::start(store, options.writers, queue_rx, cancel.clone());

    // The sender moves into the decoder; dropping it closes the queue
    let decoded = decode_feed(source, queue_tx, cancel.clone()).await;
    if let Err(e) = &decoded {
        if !matches!(e, IngestError::Cancelled) {
            error!("Decoding stopped: {}", e);
            cancel.cancel();
        }
    }

    let written = writers.join().await;

    match (decoded, written) {
        (Ok(decode), Ok(written)) => {
            info!(written, queued = decode.queued, "Ingestion complete");
            Ok(IngestSummary { decode, written })
        }
        // A writer failure cancelled the decoder; report the root cause
        (Err(IngestError::Cancelled), Err(e)) => Err(e),
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(e),
    }
}
