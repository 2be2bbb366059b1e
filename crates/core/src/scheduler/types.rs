//! Types for the check scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::topic::{TopicStoreError, TopicType, TrackingTopic};

/// Errors raised while scheduling a topic.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A schedule entry exists but the tracking file no longer describes the topic.
    #[error("no tracking config for topic: {0}")]
    MissingTopicConfig(String),

    /// The topic store has no record for the topic.
    #[error("no stored record for topic: {0}")]
    MissingTopicRecord(String),

    /// Topic store error.
    #[error("topic store error: {0}")]
    Store(#[from] TopicStoreError),
}

/// Emitted when a topic's check is due. Triggers the acquisition pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDue {
    pub topic: TrackingTopic,
    /// When the scheduler will consider the topic due again.
    pub next_check_at: DateTime<Utc>,
}

/// One pending schedule entry, as exposed by the status API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub guid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TopicType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub next_check_at: DateTime<Utc>,
}
