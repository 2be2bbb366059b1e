//! Topic check pipeline backed by a searcher and a torrent client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{LibraryConfig, TrackConfig};
use crate::layout::{DestinationDecision, LayoutClassifier, MediaCategory, TorrentFileEntry};
use crate::metrics;
use crate::searcher::{SearchHit, Searcher};
use crate::topic::{TopicStore, TopicType, TrackingTopic};
use crate::torrent_client::{parse_torrent, AddTorrentRequest, TorrentClient};
use crate::tracks::{extract_patterns, torrent_dir_name, MultiTrackSelection, TrackSelector};

use super::naming::torrent_file_name;
use super::types::{AcquisitionError, AcquisitionPlan, CheckOutcome, TopicPipeline};

/// Checks topics against the indexer and queues new releases.
pub struct TopicAcquirer {
    searcher: Arc<dyn Searcher>,
    client: Arc<dyn TorrentClient>,
    store: Arc<dyn TopicStore>,
    classifier: LayoutClassifier,
    selector: TrackSelector,
    downloads_dir: PathBuf,
}

impl TopicAcquirer {
    pub fn new(
        searcher: Arc<dyn Searcher>,
        client: Arc<dyn TorrentClient>,
        store: Arc<dyn TopicStore>,
        library: LibraryConfig,
        tracks: &TrackConfig,
        downloads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            searcher,
            client,
            store,
            classifier: LayoutClassifier::new(library),
            selector: TrackSelector::new(tracks),
            downloads_dir: downloads_dir.into(),
        }
    }

    /// Run a check as of `now`.
    pub async fn check_at(
        &self,
        topic: &TrackingTopic,
        now: DateTime<Utc>,
    ) -> Result<CheckOutcome, AcquisitionError> {
        let hits = self.searcher.search(&topic.query).await?;
        debug!(guid = %topic.guid, results = hits.len(), "Search complete");

        let Some(hit) = hits.into_iter().find(|hit| hit.guid == topic.guid) else {
            info!(guid = %topic.guid, query = %topic.query, "Topic not found in search results");
            self.store.register(&topic.guid, DateTime::<Utc>::UNIX_EPOCH)?;
            self.store.set_last_check_date(&topic.guid, now)?;
            return Ok(CheckOutcome::NotFound);
        };

        let publish_date = hit.publish_date.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        match self.store.find_by_guid(&topic.guid)? {
            None => {
                info!(guid = %topic.guid, "New topic");
                self.store.register(&topic.guid, publish_date)?;
            }
            Some(record) if record.publish_date == publish_date => {
                debug!(guid = %topic.guid, publish_date = %publish_date, "Topic unchanged");
                self.store.set_last_check_date(&topic.guid, now)?;
                return Ok(CheckOutcome::Unchanged);
            }
            Some(record) => {
                info!(
                    guid = %topic.guid,
                    previous = %record.publish_date,
                    current = %publish_date,
                    "Topic updated"
                );
                self.store.set_publish_date(&topic.guid, publish_date)?;
            }
        }
        self.store.set_last_check_date(&topic.guid, now)?;

        let plan = self.acquire(topic, &hit).await?;
        Ok(CheckOutcome::Queued(plan))
    }

    /// Download the release, decide its destination and hand it to the client.
    async fn acquire(
        &self,
        topic: &TrackingTopic,
        hit: &SearchHit,
    ) -> Result<AcquisitionPlan, AcquisitionError> {
        let link = hit.link.as_deref().ok_or_else(|| AcquisitionError::MissingLink {
            guid: hit.guid.clone(),
        })?;
        let data = self.searcher.fetch_torrent(link).await?;

        let file_name = torrent_file_name(&hit.title);
        let torrent_path = self.downloads_dir.join(&file_name);
        write_file(&torrent_path, &data).await?;
        debug!(path = %torrent_path.display(), "Saved torrent file");

        let metadata = parse_torrent(&data)?;

        let (destination, tracks) = match topic.kind {
            TopicType::TvShow => {
                let (destination, tracks) = self.route(&metadata.files)?;
                (Some(destination), tracks)
            }
            TopicType::Game => (None, None),
        };

        let mut request = AddTorrentRequest::new(data).with_filename(file_name);
        if let Some(destination) = &destination {
            request = request
                .with_save_path(destination.client_save_path.clone())
                .with_category(client_category(destination.category));
        }
        let added = self.client.add_torrent(request).await?;

        info!(
            guid = %topic.guid,
            torrent = %metadata.name,
            client = %self.client.name(),
            info_hash = ?added.info_hash,
            category = ?destination.as_ref().map(|d| d.category.as_str()),
            "Torrent queued"
        );

        let plan = AcquisitionPlan {
            torrent_path,
            torrent_name: metadata.name,
            torrent_dir_name: torrent_dir_name(&metadata.files),
            destination,
            tracks,
        };
        if let Some(globs) = plan.track_globs() {
            info!(
                guid = %topic.guid,
                video = %globs.video,
                audio = ?globs.audio,
                subtitle = ?globs.subtitle,
                "Multi-track release awaiting muxing"
            );
        }
        Ok(plan)
    }

    /// Multi-track releases go to the raw TV show category, anything else
    /// through the layout classifier.
    fn route(
        &self,
        files: &[TorrentFileEntry],
    ) -> Result<(DestinationDecision, Option<MultiTrackSelection>), AcquisitionError> {
        let patterns = extract_patterns(files);
        let selection = self.selector.select(&patterns);

        if selection.is_multi_track() {
            debug!(video = %selection.video, audio = ?selection.audio, subtitle = ?selection.subtitle, "Multi-track release");
            record_classification(MediaCategory::RawTvShow.as_str());
            return Ok((
                self.classifier.destination(MediaCategory::RawTvShow),
                Some(selection),
            ));
        }

        match self.classifier.classify(files) {
            Ok(destination) => {
                record_classification(destination.category.as_str());
                Ok((destination, None))
            }
            Err(e) => {
                record_classification("rejected");
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl TopicPipeline for TopicAcquirer {
    async fn check(&self, topic: &TrackingTopic) -> Result<CheckOutcome, AcquisitionError> {
        let result = self.check_at(topic, Utc::now()).await;
        match &result {
            Ok(outcome) => {
                metrics::TOPIC_CHECKS
                    .with_label_values(&[outcome.as_str()])
                    .inc();
            }
            Err(e) => {
                metrics::TOPIC_CHECKS.with_label_values(&["failed"]).inc();
                warn!(guid = %topic.guid, error = %e, "Topic check failed");
            }
        }
        result
    }
}

/// Category label sent to the torrent client.
fn client_category(category: MediaCategory) -> &'static str {
    match category {
        MediaCategory::RawTvShow => "RAW TV Show",
        MediaCategory::TvShow => "TV Show",
        MediaCategory::Movie => "Movie",
    }
}

fn record_classification(result: &str) {
    metrics::LAYOUT_CLASSIFICATIONS
        .with_label_values(&[result])
        .inc();
}

async fn write_file(path: &Path, data: &[u8]) -> Result<(), AcquisitionError> {
    let io_err = |source| AcquisitionError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
    }
    tokio::fs::write(path, data).await.map_err(io_err)
}
