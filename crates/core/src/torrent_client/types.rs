//! Types for torrent client operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid torrent data: {0}")]
    InvalidTorrent(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for TorrentClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TorrentClientError::Timeout
        } else if e.is_connect() {
            TorrentClientError::ConnectionFailed(e.to_string())
        } else {
            TorrentClientError::ApiError(e.to_string())
        }
    }
}

/// Request to add a .torrent file to the client.
#[derive(Debug, Clone)]
pub struct AddTorrentRequest {
    /// Raw .torrent file bytes.
    pub data: Vec<u8>,
    /// File name sent with the upload.
    pub filename: Option<String>,
    /// Save path override. The client's default is used when absent.
    pub save_path: Option<String>,
    /// Category/label.
    pub category: Option<String>,
}

impl AddTorrentRequest {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            filename: None,
            save_path: None,
            category: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_save_path(mut self, save_path: impl Into<String>) -> Self {
        self.save_path = Some(save_path.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Result of adding a torrent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddTorrentResult {
    /// Info hash, when the backend reports it.
    pub info_hash: Option<String>,
    pub name: Option<String>,
}

/// Trait for torrent client backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Add a new torrent.
    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError>;
}
