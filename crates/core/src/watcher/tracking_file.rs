//! Filesystem watch on the tracking file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::topic::TrackingTopic;

use super::detector::ChangeDetector;

/// Buffered change signals between the notify thread and the reader task.
const SIGNAL_CHANNEL_CAPACITY: usize = 16;

/// Errors from watching or reading the tracking file.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tracking file path has no file name: {0}")]
    InvalidPath(PathBuf),

    #[error("filesystem watcher error: {0}")]
    Notify(#[from] notify::Error),
}

struct Inner {
    path: PathBuf,
    detector: Mutex<ChangeDetector>,
    changes_tx: mpsc::Sender<TrackingTopic>,
}

impl Inner {
    async fn read(&self) -> Result<Option<Vec<u8>>, WatchError> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(WatchError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn detect(&self) -> Result<Vec<TrackingTopic>, WatchError> {
        let Some(raw) = self.read().await? else {
            warn!(path = %self.path.display(), "Tracking file does not exist");
            return Ok(Vec::new());
        };
        Ok(self.detector.lock().await.on_file_changed(&raw))
    }

    async fn process(&self) -> Result<usize, WatchError> {
        let changed = self.detect().await?;
        let count = changed.len();
        for topic in changed {
            if self.changes_tx.send(topic).await.is_err() {
                warn!("TopicChanged receiver dropped, event discarded");
            }
        }
        Ok(count)
    }
}

/// Watches the tracking file and sends one `TopicChanged` event per edited topic.
///
/// The parent directory is watched rather than the file itself so editors
/// that replace the file on save keep being observed.
pub struct TrackingFileWatcher {
    inner: Arc<Inner>,
    watcher: std::sync::Mutex<Option<RecommendedWatcher>>,
}

impl TrackingFileWatcher {
    /// Create a watcher for `path`. Changed topics are sent on `changes_tx`.
    pub fn new(path: impl Into<PathBuf>, changes_tx: mpsc::Sender<TrackingTopic>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                detector: Mutex::new(ChangeDetector::new()),
                changes_tx,
            }),
            watcher: std::sync::Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Read the file once and return every topic the detector reports.
    ///
    /// Called at startup before watching begins; nothing is sent on the
    /// channel. A missing file yields no topics.
    pub async fn load_initial(&self) -> Result<Vec<TrackingTopic>, WatchError> {
        self.inner.detect().await
    }

    /// Read the file and send an event for each changed topic. Returns the event count.
    pub async fn process_change(&self) -> Result<usize, WatchError> {
        self.inner.process().await
    }

    /// Begin watching. Spawns the task that reads the file on every notification.
    ///
    /// The file is read once more as soon as the watch is in place, so edits
    /// made after [`load_initial`](Self::load_initial) are not missed.
    pub fn start(&self) -> Result<(), WatchError> {
        let dir = self
            .inner
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let file_name = self
            .inner
            .path
            .file_name()
            .ok_or_else(|| WatchError::InvalidPath(self.inner.path.clone()))?
            .to_os_string();

        let (signal_tx, mut signal_rx) = mpsc::channel::<()>(SIGNAL_CHANNEL_CAPACITY);
        let catch_up_tx = signal_tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        return;
                    }
                    let touches_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if touches_file {
                        // A full channel already holds a pending re-read
                        let _ = signal_tx.try_send(());
                    }
                }
                Err(e) => error!("Tracking file watch error: {}", e),
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        // Writes since the last read are not covered by any notification
        let _ = catch_up_tx.try_send(());
        drop(catch_up_tx);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            while signal_rx.recv().await.is_some() {
                match inner.process().await {
                    Ok(count) => debug!(changed = count, "Tracking file processed"),
                    Err(e) => warn!("Failed to process tracking file change: {}", e),
                }
            }
            debug!("Tracking file reader stopped");
        });

        match self.watcher.lock() {
            Ok(mut slot) => *slot = Some(watcher),
            Err(e) => error!("Tracking file watcher lock poisoned: {}", e),
        }

        info!(path = %self.inner.path.display(), "Watching tracking file");
        Ok(())
    }

    /// Stop watching. Dropping the notify watcher ends the reader task.
    pub fn stop(&self) {
        if let Ok(mut slot) = self.watcher.lock() {
            if slot.take().is_some() {
                info!(path = %self.inner.path.display(), "Stopped watching tracking file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    const TOPICS: &str = r#"[
        {"type": "tv_show", "subsOnly": false, "query": "Show A", "guid": "a"},
        {"type": "game", "subsOnly": false, "query": "Game B", "guid": "b"}
    ]"#;

    #[tokio::test]
    async fn test_load_initial_reports_all_topics() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tracking.json");
        std::fs::write(&path, TOPICS).unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let watcher = TrackingFileWatcher::new(&path, tx);

        let topics = watcher.load_initial().await.unwrap();
        assert_eq!(topics.len(), 2);
        // Nothing sent for the initial load
        assert!(rx.try_recv().is_err());

        // Same content again is a duplicate
        assert_eq!(watcher.process_change().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let watcher = TrackingFileWatcher::new(temp_dir.path().join("missing.json"), tx);

        assert!(watcher.load_initial().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_change_sends_edited_topics() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tracking.json");
        std::fs::write(&path, TOPICS).unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let watcher = TrackingFileWatcher::new(&path, tx);
        watcher.load_initial().await.unwrap();

        std::fs::write(&path, TOPICS.replace("Show A", "Show A S02")).unwrap();
        assert_eq!(watcher.process_change().await.unwrap(), 1);

        let topic = rx.recv().await.unwrap();
        assert_eq!(topic.guid, "a");
        assert_eq!(topic.query, "Show A S02");
    }

    #[tokio::test]
    async fn test_start_catches_writes_after_initial_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tracking.json");
        std::fs::write(&path, TOPICS).unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let watcher = TrackingFileWatcher::new(&path, tx);
        watcher.load_initial().await.unwrap();

        // Edited before the watch exists
        std::fs::write(&path, TOPICS.replace("Game B", "Game B GOTY")).unwrap();
        watcher.start().unwrap();

        let topic = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(topic.guid, "b");
        assert_eq!(topic.query, "Game B GOTY");

        watcher.stop();
    }

    #[tokio::test]
    async fn test_watch_picks_up_writes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tracking.json");
        std::fs::write(&path, "[]").unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let watcher = TrackingFileWatcher::new(&path, tx);
        watcher.load_initial().await.unwrap();
        watcher.start().unwrap();

        std::fs::write(&path, TOPICS).unwrap();

        let first = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.guid, "a");

        watcher.stop();
    }
}
