//! Types for indexer search.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One release returned by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Indexer's stable id of the release, matched against the topic guid.
    pub guid: String,
    pub title: String,
    /// Download link of the `.torrent` file.
    pub link: Option<String>,
    /// Last update of the release. Changes when a new episode is added.
    pub publish_date: Option<DateTime<Utc>>,
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_connect() {
            SearchError::ConnectionFailed(e.to_string())
        } else {
            SearchError::ApiError(e.to_string())
        }
    }
}

/// Trait for torrent search backends.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Search all configured indexers for `query`.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;

    /// Download the `.torrent` file behind a hit's link.
    async fn fetch_torrent(&self, link: &str) -> Result<Vec<u8>, SearchError>;
}
