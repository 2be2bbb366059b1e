//! Pipeline that records checks instead of talking to external services.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Notify, RwLock};

use crate::acquisition::{AcquisitionError, CheckOutcome, TopicPipeline};
use crate::topic::{TopicStore, TrackingTopic};

/// Records every checked topic and answers with a fixed outcome.
///
/// With a store attached, each successful check sets the topic's last
/// check date to now, like a real pipeline does.
#[derive(Default)]
pub struct RecordingPipeline {
    store: Option<Arc<dyn TopicStore>>,
    checked: RwLock<Vec<TrackingTopic>>,
    /// If set, the next check fails with this error.
    next_error: RwLock<Option<AcquisitionError>>,
    notify: Notify,
}

impl RecordingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<dyn TopicStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    /// Topics checked so far, in completion order.
    pub async fn checked(&self) -> Vec<TrackingTopic> {
        self.checked.read().await.clone()
    }

    pub async fn set_next_error(&self, error: AcquisitionError) {
        *self.next_error.write().await = Some(error);
    }

    /// Wait until at least `count` checks completed. Returns false on timeout.
    pub async fn wait_for_checks(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                if self.checked.read().await.len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

#[async_trait]
impl TopicPipeline for RecordingPipeline {
    async fn check(&self, topic: &TrackingTopic) -> Result<CheckOutcome, AcquisitionError> {
        let result = match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => {
                if let Some(store) = &self.store {
                    store.set_last_check_date(&topic.guid, Utc::now())?;
                }
                Ok(CheckOutcome::Unchanged)
            }
        };

        self.checked.write().await.push(topic.clone());
        self.notify.notify_waiters();
        result
    }
}
