//! End-to-end lifecycle: tracking file edits flow through the scheduler into
//! the acquisition pipeline and back into the schedule.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tempfile::TempDir;
use tokio::sync::mpsc;

use topicwatch_core::config::{LibraryConfig, TrackConfig};
use topicwatch_core::testing::{fixtures, MockSearcher, MockTorrentClient, RecordingPipeline};
use topicwatch_core::{
    CheckScheduler, SchedulerConfig, SqliteTopicStore, TopicAcquirer, TopicStore, TopicTracker,
    TrackingFileWatcher,
};

fn scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        tick_interval_ms: 20,
        jitter_max_secs: 0,
        ..Default::default()
    }
}

async fn wait_until<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..250 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_new_topic_is_acquired_and_rescheduled() {
    let temp_dir = TempDir::new().unwrap();
    let tracking_path = temp_dir.path().join("tracking.json");
    std::fs::write(&tracking_path, "[]").unwrap();

    let store = Arc::new(SqliteTopicStore::new(&temp_dir.path().join("topics.db")).unwrap());
    let searcher = Arc::new(MockSearcher::new());
    let client = Arc::new(MockTorrentClient::new());

    let published = Utc::now() - ChronoDuration::days(2);
    searcher
        .set_results(vec![fixtures::search_hit("t/1", "Arcane S01", published)])
        .await;
    searcher
        .set_torrent(
            fixtures::link_for("t/1"),
            fixtures::torrent_bytes(
                "Arcane",
                &[("Arcane.S01E01.mkv", 1000), ("Arcane.S01E02.mkv", 1000)],
            ),
        )
        .await;

    let acquirer = Arc::new(TopicAcquirer::new(
        searcher.clone(),
        client.clone(),
        store.clone(),
        LibraryConfig::default(),
        &TrackConfig::default(),
        temp_dir.path().join("downloads"),
    ));

    let (scheduler, due_rx) = CheckScheduler::new(scheduler_config(), store.clone());
    let scheduler = Arc::new(scheduler);
    let tracker = Arc::new(TopicTracker::new(scheduler.clone(), store.clone(), acquirer));

    let (changes_tx, changes_rx) = mpsc::channel(16);
    let watcher = TrackingFileWatcher::new(&tracking_path, changes_tx);
    tracker.bootstrap(watcher.load_initial().await.unwrap()).await;
    tracker.run_changes(changes_rx);
    tracker.run_dispatch(due_rx);
    scheduler.start();

    std::fs::write(
        &tracking_path,
        fixtures::tracking_json(&[("tv_show", "Arcane", "t/1")]),
    )
    .unwrap();
    assert_eq!(watcher.process_change().await.unwrap(), 1);

    assert!(
        wait_until(|| async { !client.added_torrents().await.is_empty() }).await,
        "torrent was never added"
    );

    let added = client.added_torrents().await;
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].request.save_path.as_deref(), Some("/downloads/tv"));
    assert!(temp_dir.path().join("downloads/arcane_s01.torrent").exists());

    let record = store.find_by_guid("t/1").unwrap().unwrap();
    assert_eq!(record.publish_date.timestamp(), published.timestamp());
    assert!(record.last_check_date.is_some());

    // Rescheduled from the fresh last check date, not due again right away
    assert!(
        wait_until(|| async {
            scheduler
                .next_check_at("t/1")
                .await
                .is_some_and(|next| next > Utc::now())
        })
        .await
    );
    assert_eq!(searcher.search_count().await, 1);

    scheduler.stop();
}

#[tokio::test]
async fn test_restart_restores_schedule_from_store() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("topics.db");
    let topics = vec![
        topicwatch_core::TrackingTopic::new(topicwatch_core::TopicType::TvShow, "Show", "a"),
        topicwatch_core::TrackingTopic::new(topicwatch_core::TopicType::Game, "Game", "b"),
    ];

    // First run: check both topics once
    {
        let store = Arc::new(SqliteTopicStore::new(&db_path).unwrap());
        let (scheduler, due_rx) = CheckScheduler::new(scheduler_config(), store.clone());
        let scheduler = Arc::new(scheduler);
        let pipeline = Arc::new(RecordingPipeline::with_store(store.clone()));
        let tracker = Arc::new(TopicTracker::new(scheduler.clone(), store.clone(), pipeline.clone()));

        tracker.bootstrap(topics.clone()).await;
        tracker.run_dispatch(due_rx);
        scheduler.start();

        assert!(pipeline.wait_for_checks(2, Duration::from_secs(5)).await);
        scheduler.stop();
    }

    // Second run: nothing is due immediately
    let store = Arc::new(SqliteTopicStore::new(&db_path).unwrap());
    for guid in ["a", "b"] {
        assert!(store.find_by_guid(guid).unwrap().unwrap().last_check_date.is_some());
    }

    let (scheduler, _due_rx) = CheckScheduler::new(scheduler_config(), store.clone());
    let scheduler = Arc::new(scheduler);
    let pipeline = Arc::new(RecordingPipeline::new());
    let tracker = TopicTracker::new(scheduler.clone(), store.clone(), pipeline);

    assert_eq!(tracker.bootstrap(topics).await, 2);
    assert_eq!(scheduler.tick().await, 0);

    let snapshot = scheduler.pending_snapshot().await;
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().all(|entry| entry.next_check_at > Utc::now()));
}

#[tokio::test]
async fn test_unchanged_duplicate_write_emits_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let tracking_path = temp_dir.path().join("tracking.json");
    let content = fixtures::tracking_json(&[("tv_show", "Show", "a"), ("game", "Game", "b")]);
    std::fs::write(&tracking_path, &content).unwrap();

    let (changes_tx, mut changes_rx) = mpsc::channel(16);
    let watcher = TrackingFileWatcher::new(&tracking_path, changes_tx);
    assert_eq!(watcher.load_initial().await.unwrap().len(), 2);

    // Same topics, different formatting
    let reformatted: serde_json::Value = serde_json::from_str(&content).unwrap();
    std::fs::write(&tracking_path, serde_json::to_string_pretty(&reformatted).unwrap()).unwrap();
    assert_eq!(watcher.process_change().await.unwrap(), 0);

    // Broken JSON is ignored, the next valid edit is still detected
    std::fs::write(&tracking_path, "[{").unwrap();
    assert_eq!(watcher.process_change().await.unwrap(), 0);

    std::fs::write(
        &tracking_path,
        fixtures::tracking_json(&[("tv_show", "Show S02", "a"), ("game", "Game", "b")]),
    )
    .unwrap();
    assert_eq!(watcher.process_change().await.unwrap(), 1);
    assert_eq!(changes_rx.recv().await.unwrap().query, "Show S02");
}
