pub mod acquisition;
pub mod config;
pub mod layout;
pub mod metrics;
pub mod scheduler;
pub mod searcher;
pub mod testing;
pub mod topic;
pub mod torrent_client;
pub mod tracker;
pub mod tracks;
pub mod watcher;

pub use acquisition::{AcquisitionError, AcquisitionPlan, CheckOutcome, TopicAcquirer, TopicPipeline};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig};
pub use layout::{DestinationDecision, LayoutClassifier, LayoutError, MediaCategory, TorrentFileEntry};
pub use scheduler::{calculate_interval, CheckScheduler, ScheduleEntry, SchedulerConfig, SchedulerError, TopicDue};
pub use searcher::{JackettSearcher, SearchError, SearchHit, Searcher};
pub use topic::{SqliteTopicStore, TopicRecord, TopicStore, TopicStoreError, TopicType, TrackingTopic};
pub use torrent_client::{QBittorrentClient, TorrentClient, TorrentClientError};
pub use tracker::TopicTracker;
pub use tracks::{MultiTrackSelection, TrackSelector};
pub use watcher::{ChangeDetector, TrackingFileWatcher, WatchError};
