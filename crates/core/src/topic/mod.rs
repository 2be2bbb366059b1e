//! Tracked topics: the tracking-file model and the per-topic record store.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTopicStore;
pub use store::{TopicStore, TopicStoreError};
pub use types::{parse_tracking_list, TopicRecord, TopicType, TrackingParseError, TrackingTopic};
