//! Mock torrent client for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::torrent_client::{
    parse_torrent, AddTorrentRequest, AddTorrentResult, TorrentClient, TorrentClientError,
};

/// A recorded torrent addition for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedAddTorrent {
    pub request: AddTorrentRequest,
    pub timestamp: DateTime<Utc>,
}

/// Mock implementation of the TorrentClient trait.
///
/// Records every added torrent. Info hash and name are read from the
/// torrent data when it parses.
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    added: RwLock<Vec<RecordedAddTorrent>>,
    /// If set, the next add fails with this error.
    next_error: RwLock<Option<TorrentClientError>>,
}

impl MockTorrentClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded add_torrent calls.
    pub async fn added_torrents(&self) -> Vec<RecordedAddTorrent> {
        self.added.read().await.clone()
    }

    /// Configure the next add to fail with the given error.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let metadata = parse_torrent(&request.data).ok();
        self.added.write().await.push(RecordedAddTorrent {
            request,
            timestamp: Utc::now(),
        });

        Ok(AddTorrentResult {
            info_hash: metadata.as_ref().map(|m| m.info_hash.clone()),
            name: metadata.map(|m| m.name),
        })
    }
}
