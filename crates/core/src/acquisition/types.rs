//! Types for the topic check pipeline.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::layout::{DestinationDecision, LayoutError};
use crate::searcher::SearchError;
use crate::topic::{TopicStoreError, TrackingTopic};
use crate::torrent_client::{TorrentClientError, TorrentParseError};
use crate::tracks::{wildify_square_brackets, MultiTrackSelection};

/// Errors that abort a topic check.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    #[error("topic store error: {0}")]
    Store(#[from] TopicStoreError),

    #[error("search result for {guid} has no download link")]
    MissingLink { guid: String },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid torrent file: {0}")]
    TorrentParse(#[from] TorrentParseError),

    #[error("unsupported torrent layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("torrent client error: {0}")]
    TorrentClient(#[from] TorrentClientError),
}

/// What a downloaded torrent turned into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquisitionPlan {
    /// Where the .torrent file was saved.
    pub torrent_path: PathBuf,
    /// Root name inside the torrent.
    pub torrent_name: String,
    /// Library destination. `None` keeps the client's default save path.
    pub destination: Option<DestinationDecision>,
    /// Chosen tracks of a multi-track release.
    pub tracks: Option<MultiTrackSelection>,
    /// Directory holding the video files, if any.
    pub torrent_dir_name: Option<String>,
}

impl AcquisitionPlan {
    /// Track patterns resolved under the library destination, usable as globs
    /// once the download has landed there.
    pub fn track_globs(&self) -> Option<MultiTrackSelection> {
        let tracks = self.tracks.as_ref()?;
        let base = self
            .destination
            .as_ref()
            .map(|d| d.library_category_path.trim_end_matches(['/', '\\']))
            .unwrap_or_default();
        let resolve = |pattern: &str| {
            if pattern.is_empty() {
                return String::new();
            }
            let full = if base.is_empty() {
                pattern.to_string()
            } else {
                format!("{base}/{pattern}")
            };
            wildify_square_brackets(&full)
        };

        Some(MultiTrackSelection {
            video: resolve(&tracks.video),
            audio: tracks.audio.as_deref().map(resolve),
            subtitle: tracks.subtitle.as_deref().map(resolve),
        })
    }
}

/// Result of one topic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The indexer returned no result with the topic's guid.
    NotFound,
    /// The release has not changed since the last check.
    Unchanged,
    /// A new release was handed to the torrent client.
    Queued(AcquisitionPlan),
}

impl CheckOutcome {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckOutcome::NotFound => "not_found",
            CheckOutcome::Unchanged => "unchanged",
            CheckOutcome::Queued(_) => "queued",
        }
    }
}

/// Runs a check for a due topic.
///
/// Implementations update the topic's last check date in the store before
/// returning `Ok`, the caller reschedules from it.
#[async_trait]
pub trait TopicPipeline: Send + Sync {
    async fn check(&self, topic: &TrackingTopic) -> Result<CheckOutcome, AcquisitionError>;
}
