//! Check scheduler implementation.
//!
//! Owns the `guid -> next check` map. Two sources mutate it:
//! - Topic change events (new topics become due immediately)
//! - The polling loop (due topics are pushed to their next target hour)
//!
//! Both go through one mutex, so an entry is never written by two callers at once.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::metrics;
use crate::topic::{TopicStore, TrackingTopic};

use super::config::SchedulerConfig;
use super::interval::calculate_interval;
use super::types::{ScheduleEntry, SchedulerError, TopicDue};

/// Capacity of the `TopicDue` channel.
const DUE_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct ScheduleState {
    /// Next time a check is due, per guid.
    pending: HashMap<String, DateTime<Utc>>,
    /// Latest known tracking entry, per guid.
    topics: HashMap<String, TrackingTopic>,
}

impl ScheduleState {
    fn publish_size(&self) {
        metrics::PENDING_TOPICS.set(self.pending.len() as i64);
    }
}

struct Shared {
    config: SchedulerConfig,
    store: Arc<dyn TopicStore>,
    state: Mutex<ScheduleState>,
    due_tx: mpsc::Sender<TopicDue>,
}

/// Decides when each tracked topic is checked next and emits `TopicDue` events.
pub struct CheckScheduler {
    shared: Arc<Shared>,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl CheckScheduler {
    /// Create a scheduler and the receiving end of its `TopicDue` channel.
    pub fn new(
        config: SchedulerConfig,
        store: Arc<dyn TopicStore>,
    ) -> (Self, mpsc::Receiver<TopicDue>) {
        let (due_tx, due_rx) = mpsc::channel(DUE_CHANNEL_CAPACITY);
        let (shutdown_tx, _) = broadcast::channel(1);

        let scheduler = Self {
            shared: Arc::new(Shared {
                config,
                store,
                state: Mutex::new(ScheduleState::default()),
                due_tx,
            }),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        };

        (scheduler, due_rx)
    }

    /// Record a new or edited topic. A topic without a schedule entry becomes due now.
    pub async fn on_topic_changed(&self, topic: TrackingTopic) {
        self.on_topic_changed_at(topic, Utc::now()).await;
    }

    /// Same as [`on_topic_changed`](Self::on_topic_changed) with an explicit clock.
    pub async fn on_topic_changed_at(&self, topic: TrackingTopic, now: DateTime<Utc>) {
        let guid = topic.guid.clone();
        let mut state = self.shared.state.lock().await;
        state.topics.insert(guid.clone(), topic);

        match state.pending.entry(guid) {
            Entry::Vacant(entry) => {
                debug!(guid = %entry.key(), "Topic scheduled for immediate check");
                entry.insert(now);
            }
            Entry::Occupied(entry) => {
                debug!(guid = %entry.key(), due = %entry.get(), "Topic already scheduled");
            }
        }
        state.publish_size();
    }

    /// Rebuild a topic's schedule entry from its stored last check date.
    ///
    /// A topic that was checked before is due at its next target hour plus
    /// jitter; one that never was is due now. Existing entries are kept.
    pub async fn restore(&self, topic: TrackingTopic) -> Result<DateTime<Utc>, SchedulerError> {
        self.restore_at(topic, Utc::now()).await
    }

    /// Same as [`restore`](Self::restore) with an explicit clock.
    pub async fn restore_at(
        &self,
        topic: TrackingTopic,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, SchedulerError> {
        let last_check = self
            .shared
            .store
            .find_by_guid(&topic.guid)?
            .and_then(|record| record.last_check_date);

        let due = match last_check {
            Some(last) => {
                let hour = self.shared.config.target_hours.hour_for(topic.kind);
                now + calculate_interval(hour, Some(last), now) + self.shared.jitter()
            }
            None => now,
        };

        let guid = topic.guid.clone();
        let mut state = self.shared.state.lock().await;
        state.topics.insert(guid.clone(), topic);
        let due = *state.pending.entry(guid.clone()).or_insert(due);
        state.publish_size();

        info!(guid = %guid, due = %due, "Restored topic schedule");
        Ok(due)
    }

    /// Recompute a topic's next check right after its last check date changed.
    ///
    /// Overwrites any pending entry, without jitter.
    pub async fn reschedule(&self, topic: TrackingTopic) -> Result<DateTime<Utc>, SchedulerError> {
        self.reschedule_at(topic, Utc::now()).await
    }

    /// Same as [`reschedule`](Self::reschedule) with an explicit clock.
    pub async fn reschedule_at(
        &self,
        topic: TrackingTopic,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, SchedulerError> {
        let record = self
            .shared
            .store
            .find_by_guid(&topic.guid)?
            .ok_or_else(|| SchedulerError::MissingTopicRecord(topic.guid.clone()))?;

        let hour = self.shared.config.target_hours.hour_for(topic.kind);
        let next = now + calculate_interval(hour, record.last_check_date, now);

        let guid = topic.guid.clone();
        let mut state = self.shared.state.lock().await;
        state.topics.insert(guid.clone(), topic);
        state.pending.insert(guid.clone(), next);
        state.publish_size();

        info!(guid = %guid, next_check_at = %next, "Topic rescheduled");
        Ok(next)
    }

    /// Run one scheduling pass at the current time.
    pub async fn tick(&self) -> usize {
        self.shared.tick(Utc::now()).await
    }

    /// Run one scheduling pass as of `now`. Returns the number of `TopicDue` events emitted.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> usize {
        self.shared.tick(now).await
    }

    /// Next check time of one topic, if scheduled.
    pub async fn next_check_at(&self, guid: &str) -> Option<DateTime<Utc>> {
        self.shared.state.lock().await.pending.get(guid).copied()
    }

    /// All pending entries, earliest first.
    pub async fn pending_snapshot(&self) -> Vec<ScheduleEntry> {
        let state = self.shared.state.lock().await;
        let mut entries: Vec<ScheduleEntry> = state
            .pending
            .iter()
            .map(|(guid, due)| {
                let topic = state.topics.get(guid);
                ScheduleEntry {
                    guid: guid.clone(),
                    kind: topic.map(|t| t.kind),
                    query: topic.map(|t| t.query.clone()),
                    next_check_at: *due,
                }
            })
            .collect();
        entries.sort_by(|a, b| {
            a.next_check_at
                .cmp(&b.next_check_at)
                .then_with(|| a.guid.cmp(&b.guid))
        });
        entries
    }

    /// Whether the polling loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start the polling loop (spawns a background task).
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return;
        }

        let shared = Arc::clone(&self.shared);
        let running = Arc::clone(&self.running);
        let tick_interval = Duration::from_millis(shared.config.tick_interval_ms);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!(
            tick_interval_ms = shared.config.tick_interval_ms,
            "Starting check scheduler"
        );

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Scheduler loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(tick_interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        shared.tick(Utc::now()).await;
                    }
                }
            }
            info!("Scheduler loop stopped");
        });
    }

    /// Stop the polling loop.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Scheduler not running");
            return;
        }

        info!("Stopping check scheduler");
        let _ = self.shutdown_tx.send(());
    }
}

impl Shared {
    async fn tick(&self, now: DateTime<Utc>) -> usize {
        let mut due_events = Vec::new();

        {
            let mut state = self.state.lock().await;

            let mut due: Vec<(String, DateTime<Utc>)> = state
                .pending
                .iter()
                .filter(|(_, due)| **due <= now)
                .map(|(guid, due)| (guid.clone(), *due))
                .collect();
            due.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

            for (guid, _) in due {
                match self.next_check(&state, &guid, now) {
                    Ok((topic, next_check_at)) => {
                        state.pending.insert(guid, next_check_at);
                        due_events.push(TopicDue {
                            topic,
                            next_check_at,
                        });
                    }
                    Err(e) => {
                        let reason = match &e {
                            SchedulerError::MissingTopicConfig(_) => "missing_config",
                            SchedulerError::MissingTopicRecord(_) => "missing_record",
                            SchedulerError::Store(_) => "store_error",
                        };
                        metrics::SCHEDULE_SKIPS.with_label_values(&[reason]).inc();
                        warn!(guid = %guid, "Skipping due topic: {}", e);
                    }
                }
            }
        }

        let emitted = due_events.len();
        for event in due_events {
            metrics::TOPICS_DUE.inc();
            info!(
                guid = %event.topic.guid,
                query = %event.topic.query,
                next_check_at = %event.next_check_at,
                "Topic due for check"
            );
            if self.due_tx.send(event).await.is_err() {
                warn!("TopicDue receiver dropped, event discarded");
            }
        }

        emitted
    }

    fn next_check(
        &self,
        state: &ScheduleState,
        guid: &str,
        now: DateTime<Utc>,
    ) -> Result<(TrackingTopic, DateTime<Utc>), SchedulerError> {
        let topic = state
            .topics
            .get(guid)
            .cloned()
            .ok_or_else(|| SchedulerError::MissingTopicConfig(guid.to_string()))?;

        let record = self
            .store
            .find_by_guid(guid)?
            .ok_or_else(|| SchedulerError::MissingTopicRecord(guid.to_string()))?;

        let hour = self.config.target_hours.hour_for(topic.kind);
        let next = now + calculate_interval(hour, record.last_check_date, now) + self.jitter();

        Ok((topic, next))
    }

    fn jitter(&self) -> ChronoDuration {
        if self.config.jitter_max_secs == 0 {
            return ChronoDuration::zero();
        }
        let secs = rand::rng().random_range(0..=self.config.jitter_max_secs);
        ChronoDuration::seconds(secs as i64)
    }
}
