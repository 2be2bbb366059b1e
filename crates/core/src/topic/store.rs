//! Topic storage trait.

use std::fmt;

use chrono::{DateTime, Utc};

use super::TopicRecord;

/// Error type for topic store operations.
#[derive(Debug)]
pub enum TopicStoreError {
    /// No record for the given guid.
    NotFound(String),
    /// Database error.
    Database(String),
}

impl fmt::Display for TopicStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicStoreError::NotFound(guid) => write!(f, "Topic not found: {}", guid),
            TopicStoreError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for TopicStoreError {}

/// Trait for topic storage backends.
pub trait TopicStore: Send + Sync {
    /// Get a topic record by guid.
    fn find_by_guid(&self, guid: &str) -> Result<Option<TopicRecord>, TopicStoreError>;

    /// Insert a record if none exists for `guid`; returns the stored record.
    fn register(
        &self,
        guid: &str,
        publish_date: DateTime<Utc>,
    ) -> Result<TopicRecord, TopicStoreError>;

    /// Update the last known publish date.
    fn set_publish_date(
        &self,
        guid: &str,
        publish_date: DateTime<Utc>,
    ) -> Result<(), TopicStoreError>;

    /// Update the time the last check completed.
    fn set_last_check_date(
        &self,
        guid: &str,
        checked_at: DateTime<Utc>,
    ) -> Result<(), TopicStoreError>;
}
