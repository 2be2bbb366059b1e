//! Topic types shared by the watcher, scheduler and acquisition pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of media a topic tracks. Decides the hour of day its check runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicType {
    TvShow,
    Game,
}

impl TopicType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicType::TvShow => "tv_show",
            TopicType::Game => "game",
        }
    }
}

impl std::fmt::Display for TopicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the tracking file.
///
/// Field order is part of the canonical serialization used for change
/// detection, do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingTopic {
    #[serde(rename = "type")]
    pub kind: TopicType,
    /// Downstream filter hint, passed through untouched.
    #[serde(default)]
    pub subs_only: bool,
    /// Search string sent to the indexer.
    pub query: String,
    /// Stable identity of the topic.
    pub guid: String,
}

impl TrackingTopic {
    pub fn new(kind: TopicType, query: impl Into<String>, guid: impl Into<String>) -> Self {
        Self {
            kind,
            subs_only: false,
            query: query.into(),
            guid: guid.into(),
        }
    }
}

/// Persisted state of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub guid: String,
    /// Last known release timestamp reported by the indexer.
    pub publish_date: DateTime<Utc>,
    /// When a check last completed. `None` until the first check.
    pub last_check_date: Option<DateTime<Utc>>,
}

/// The tracking file could not be read as a topic list.
#[derive(Debug, Error)]
#[error("invalid tracking file: {0}")]
pub struct TrackingParseError(#[from] serde_json::Error);

/// Parse the raw tracking file content (a JSON array of topics).
pub fn parse_tracking_list(raw: &[u8]) -> Result<Vec<TrackingTopic>, TrackingParseError> {
    Ok(serde_json::from_slice(raw)?)
}
