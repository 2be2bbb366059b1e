//! Topic tracker.
//!
//! Connects the tracking file, the topic store, the check scheduler and the
//! check pipeline: changed topics get a record and a schedule entry, due
//! topics are checked and rescheduled from their new last check date.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::acquisition::TopicPipeline;
use crate::scheduler::{CheckScheduler, TopicDue};
use crate::topic::{TopicStore, TopicStoreError, TrackingTopic};

pub struct TopicTracker {
    scheduler: Arc<CheckScheduler>,
    store: Arc<dyn TopicStore>,
    pipeline: Arc<dyn TopicPipeline>,
}

impl TopicTracker {
    pub fn new(
        scheduler: Arc<CheckScheduler>,
        store: Arc<dyn TopicStore>,
        pipeline: Arc<dyn TopicPipeline>,
    ) -> Self {
        Self {
            scheduler,
            store,
            pipeline,
        }
    }

    /// Schedule the topics read at startup. Returns how many were restored.
    pub async fn bootstrap(&self, topics: Vec<TrackingTopic>) -> usize {
        let mut restored = 0;
        for topic in topics {
            let guid = topic.guid.clone();
            if let Err(e) = self.ensure_record(&guid) {
                error!(guid = %guid, "Failed to register topic: {}", e);
                continue;
            }
            match self.scheduler.restore(topic).await {
                Ok(_) => restored += 1,
                Err(e) => error!(guid = %guid, "Failed to restore topic schedule: {}", e),
            }
        }
        info!(topics = restored, "Topic schedules restored");
        restored
    }

    /// Handle one `TopicChanged` event.
    pub async fn handle_topic_changed(&self, topic: TrackingTopic) {
        if let Err(e) = self.ensure_record(&topic.guid) {
            // The scheduler skips the topic until a record exists
            error!(guid = %topic.guid, "Failed to register topic: {}", e);
        }
        self.scheduler.on_topic_changed(topic).await;
    }

    /// Consume `TopicChanged` events until the channel closes.
    pub fn run_changes(self: &Arc<Self>, mut changes_rx: mpsc::Receiver<TrackingTopic>) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(topic) = changes_rx.recv().await {
                debug!(guid = %topic.guid, "Topic changed");
                tracker.handle_topic_changed(topic).await;
            }
            debug!("Topic change loop stopped");
        })
    }

    /// Consume `TopicDue` events until the channel closes.
    ///
    /// Each check runs in its own task; the loop does not wait for it.
    pub fn run_dispatch(self: &Arc<Self>, mut due_rx: mpsc::Receiver<TopicDue>) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(due) = due_rx.recv().await {
                let tracker = Arc::clone(&tracker);
                tokio::spawn(async move {
                    tracker.run_check(due.topic).await;
                });
            }
            debug!("Dispatch loop stopped");
        })
    }

    /// Check one topic and reschedule it on success.
    ///
    /// A failed check keeps the next check time assigned when it came due.
    pub async fn run_check(&self, topic: TrackingTopic) {
        let guid = topic.guid.clone();
        match self.pipeline.check(&topic).await {
            Ok(outcome) => {
                info!(guid = %guid, outcome = outcome.as_str(), "Topic check complete");
                match self.scheduler.reschedule(topic).await {
                    Ok(next) => debug!(guid = %guid, next_check_at = %next, "Next check"),
                    Err(e) => warn!(guid = %guid, "Failed to reschedule topic: {}", e),
                }
            }
            Err(e) => warn!(guid = %guid, "Topic check failed: {}", e),
        }
    }

    fn ensure_record(&self, guid: &str) -> Result<(), TopicStoreError> {
        if self.store.find_by_guid(guid)?.is_none() {
            self.store.register(guid, DateTime::<Utc>::UNIX_EPOCH)?;
            debug!(guid = %guid, "Registered topic");
        }
        Ok(())
    }
}
