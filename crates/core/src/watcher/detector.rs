//! Turns noisy tracking-file notifications into per-topic change events.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::metrics;
use crate::topic::{parse_tracking_list, TrackingTopic};

use super::hasher::content_hash;

/// Remembers the last seen hash of the whole file and of every topic.
///
/// Both caches live in memory only; after a restart every topic is reported
/// once more.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last_full_hash: Option<String>,
    last_topic_hash: HashMap<String, String>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process the raw tracking file content after a change notification.
    ///
    /// Returns the topics whose serialized form differs from the last one
    /// seen, in file order. Content identical to the previous call yields
    /// nothing. A document that fails to parse is logged and yields nothing,
    /// but its hash is kept so the same broken content is not parsed twice.
    pub fn on_file_changed(&mut self, raw: &[u8]) -> Vec<TrackingTopic> {
        let full_hash = content_hash(raw);
        if self.last_full_hash.as_deref() == Some(full_hash.as_str()) {
            debug!("Tracking file content unchanged, ignoring notification");
            metrics::TRACKING_FILE_EVENTS
                .with_label_values(&["duplicate"])
                .inc();
            return Vec::new();
        }
        self.last_full_hash = Some(full_hash);

        let topics = match parse_tracking_list(raw) {
            Ok(topics) => topics,
            Err(e) => {
                warn!("Failed to parse tracking file: {}", e);
                metrics::TRACKING_FILE_EVENTS
                    .with_label_values(&["parse_error"])
                    .inc();
                return Vec::new();
            }
        };
        metrics::TRACKING_FILE_EVENTS
            .with_label_values(&["changed"])
            .inc();

        let mut changed = Vec::new();
        for topic in topics {
            let serialized = match serde_json::to_vec(&topic) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(guid = %topic.guid, "Failed to serialize topic: {}", e);
                    continue;
                }
            };
            let topic_hash = content_hash(&serialized);

            if self.last_topic_hash.get(&topic.guid) == Some(&topic_hash) {
                continue;
            }
            self.last_topic_hash.insert(topic.guid.clone(), topic_hash);

            info!(guid = %topic.guid, query = %topic.query, "Topic changed");
            metrics::TOPIC_CHANGES.inc();
            changed.push(topic);
        }

        changed
    }
}
