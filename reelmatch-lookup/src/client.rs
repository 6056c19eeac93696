//! Review service client
//!
//! Searches the external review service by title. Every request consumes a
//! [`RateToken`], so callers cannot bypass the rate limiter.

use crate::normalize::escape_query;
use crate::{LookupError, RateToken, SearchResponse};
use async_trait::async_trait;
use reelmatch_common::config::{LookupConfig, QueryStyle};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// Default timeout for search requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("reelmatch/", env!("CARGO_PKG_VERSION"));

/// Title search against a review catalog
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Search for `title`, spending `token`
    async fn search(&self, token: RateToken, title: &str) -> Result<SearchResponse, LookupError>;
}

/// HTTP client for the review service's movie search endpoint
#[derive(Debug, Clone)]
pub struct ReviewClient {
    http_client: Client,
    search_url: Url,
    api_key: Option<String>,
    limit: u32,
    query_style: QueryStyle,
}

impl ReviewClient {
    /// Create a client from lookup settings and an already resolved API key
    pub fn new(config: &LookupConfig, api_key: Option<String>) -> Result<Self, LookupError> {
        let search_url = Url::parse(&config.search_url).map_err(|e| {
            reelmatch_common::Error::Config(format!(
                "Invalid search URL {}: {}",
                config.search_url, e
            ))
        })?;

        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http_client,
            search_url,
            api_key,
            limit: config.limit,
            query_style: config.query_style,
        })
    }

    /// Full request URL for a title search
    pub fn request_url(&self, title: &str) -> Url {
        let mut url = self.search_url.clone();
        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = &self.api_key {
                query.append_pair("apikey", key);
            }
            query.append_pair("limit", &self.limit.to_string());
            if self.query_style == QueryStyle::PerWord {
                for word in title.split_whitespace() {
                    query.append_pair("q", word);
                }
            }
        }

        if self.query_style == QueryStyle::Joined {
            // Appended raw: `+` must reach the service as a word separator
            let joined = format!("{}&q={}", url.query().unwrap_or_default(), escape_query(title));
            url.set_query(Some(&joined));
        }
        url
    }
}

#[async_trait]
impl SearchService for ReviewClient {
    async fn search(&self, _token: RateToken, title: &str) -> Result<SearchResponse, LookupError> {
        debug!(title = %title, "Searching review service");

        let response = self
            .http_client
            .get(self.request_url(title))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Status { status, body });
        }

        let body = response.bytes().await?;
        let result: SearchResponse = serde_json::from_slice(&body)?;

        debug!(
            title = %title,
            total = result.total,
            returned = result.movies.len(),
            "Search complete"
        );
        Ok(result)
    }
}
