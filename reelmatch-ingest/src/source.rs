//! Feed sources
//!
//! The decoder only needs a buffered byte stream; this module opens one from
//! a local file or from the remote catalog endpoint.

use crate::IngestError;
use futures::TryStreamExt;
use reelmatch_common::config::FeedConfig;
use reqwest::header;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, BufReader};
use tokio_util::io::StreamReader;
use tracing::info;

/// Boxed byte stream handed to the decoder
pub type FeedReader = Box<dyn AsyncBufRead + Send + Unpin>;

/// Where the catalog feed comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// Local copy of the catalog document
    File(PathBuf),
    /// Remote catalog endpoint
    Remote {
        url: String,
        /// Opaque, pre-computed `Authorization` header value
        authorization: String,
    },
}

impl FeedSource {
    /// Pick the source from configuration
    ///
    /// Remote fetching without configured authorization is a fatal startup
    /// error.
    pub fn from_config(feed: &FeedConfig, fetch: bool) -> Result<Self, IngestError> {
        if fetch {
            Ok(FeedSource::Remote {
                url: feed.url.clone(),
                authorization: feed.require_authorization()?.to_string(),
            })
        } else {
            Ok(FeedSource::File(feed.path.clone()))
        }
    }

    /// Open the byte stream
    pub async fn open(&self) -> Result<FeedReader, IngestError> {
        match self {
            FeedSource::File(path) => {
                info!("Reading catalog from file {}", path.display());
                let file = tokio::fs::File::open(path).await?;
                Ok(Box::new(BufReader::new(file)))
            }
            FeedSource::Remote { url, authorization } => {
                info!("Fetching catalog from {}", url);
                // gzip support negotiates Accept-Encoding and decompresses transparently
                let client = reqwest::Client::builder().gzip(true).build()?;
                let response = client
                    .get(url)
                    .header(header::AUTHORIZATION, authorization)
                    .send()
                    .await?
                    .error_for_status()?;

                let body = response
                    .bytes_stream()
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
                Ok(Box::new(StreamReader::new(Box::pin(body))))
            }
        }
    }
}
