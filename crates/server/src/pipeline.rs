//! Stand-in check pipeline used when no searcher or torrent client is configured.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use topicwatch_core::{AcquisitionError, CheckOutcome, TopicPipeline, TopicStore, TrackingTopic};

/// Logs due topics and marks them checked, without searching.
pub struct LoggingPipeline {
    store: Arc<dyn TopicStore>,
}

impl LoggingPipeline {
    pub fn new(store: Arc<dyn TopicStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TopicPipeline for LoggingPipeline {
    async fn check(&self, topic: &TrackingTopic) -> Result<CheckOutcome, AcquisitionError> {
        info!(
            guid = %topic.guid,
            query = %topic.query,
            kind = %topic.kind,
            "Topic due (no searcher configured, skipping search)"
        );
        self.store.set_last_check_date(&topic.guid, Utc::now())?;
        Ok(CheckOutcome::Unchanged)
    }
}
