use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::scheduler::SchedulerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub tracks: TrackConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub searcher: Option<SearcherConfig>,
    #[serde(default)]
    pub torrent_client: Option<TorrentClientConfig>,
}

/// Status API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("topicwatch.db")
}

/// Log output configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Location of the tracking file listing watched topics
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackingConfig {
    #[serde(default = "default_tracking_path")]
    pub path: PathBuf,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            path: default_tracking_path(),
        }
    }
}

fn default_tracking_path() -> PathBuf {
    PathBuf::from("~/.config/torrents/tracking.json")
}

impl TrackingConfig {
    /// Tracking file path with a leading `~` expanded to the home directory.
    pub fn resolved_path(&self) -> PathBuf {
        expand_tilde(&self.path)
    }
}

/// Expand a leading `~` component to the current user's home directory.
pub fn expand_tilde(path: &std::path::Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// A pair of paths describing where one library category lives.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CategoryPaths {
    /// Path handed to the torrent client as the save path.
    pub client_path: String,
    /// Library path of the category as seen by this process.
    pub library_path: String,
}

impl CategoryPaths {
    pub fn new(client_path: impl Into<String>, library_path: impl Into<String>) -> Self {
        Self {
            client_path: client_path.into(),
            library_path: library_path.into(),
        }
    }
}

/// Category to path mapping used by the layout classifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    #[serde(default = "default_movies")]
    pub movies: CategoryPaths,
    #[serde(default = "default_tv_shows")]
    pub tv_shows: CategoryPaths,
    /// Destination for multi-track releases that still need muxing.
    #[serde(default = "default_raw_tv_shows")]
    pub raw_tv_shows: CategoryPaths,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            movies: default_movies(),
            tv_shows: default_tv_shows(),
            raw_tv_shows: default_raw_tv_shows(),
        }
    }
}

fn default_movies() -> CategoryPaths {
    CategoryPaths::new("/downloads/movies", "/library/movies")
}

fn default_tv_shows() -> CategoryPaths {
    CategoryPaths::new("/downloads/tv", "/library/tv")
}

fn default_raw_tv_shows() -> CategoryPaths {
    CategoryPaths::new("/downloads/raw-tv", "/library/raw-tv")
}

/// Multi-track selection rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackConfig {
    #[serde(default = "default_video_extension")]
    pub video_extension: String,
    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,
    #[serde(default = "default_subtitle_extension")]
    pub subtitle_extension: String,
    /// Ordered audio name patterns, later entries are preferred.
    #[serde(default)]
    pub audio_priorities: Vec<String>,
    /// Ordered subtitle name patterns, later entries are preferred.
    #[serde(default)]
    pub subtitle_priorities: Vec<String>,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            video_extension: default_video_extension(),
            audio_extension: default_audio_extension(),
            subtitle_extension: default_subtitle_extension(),
            audio_priorities: Vec::new(),
            subtitle_priorities: Vec::new(),
        }
    }
}

fn default_video_extension() -> String {
    "mkv".to_string()
}

fn default_audio_extension() -> String {
    "mka".to_string()
}

fn default_subtitle_extension() -> String {
    "ass".to_string()
}

/// Acquisition pipeline settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// Directory where downloaded .torrent files are stored.
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: PathBuf,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            downloads_dir: default_downloads_dir(),
        }
    }
}

fn default_downloads_dir() -> PathBuf {
    PathBuf::from("downloads")
}

/// Searcher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearcherConfig {
    /// Search backend type
    pub backend: SearcherBackend,
    /// Jackett-specific configuration (required when backend = "jackett")
    #[serde(default)]
    pub jackett: Option<JackettConfig>,
}

/// Available search backends
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearcherBackend {
    Jackett,
}

/// Jackett search backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JackettConfig {
    /// Jackett server URL (e.g., "http://localhost:9117")
    pub url: String,
    /// Jackett API key
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Torrent client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrentClientConfig {
    pub backend: TorrentClientBackend,
    #[serde(default)]
    pub qbittorrent: Option<QBittorrentConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TorrentClientBackend {
    #[serde(rename = "qbittorrent")]
    QBittorrent,
}

/// qBittorrent Web API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI URL (e.g., "http://localhost:8080")
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub tracking: TrackingConfig,
    pub scheduler: SchedulerConfig,
    pub library: LibraryConfig,
    pub tracks: TrackConfig,
    pub acquisition: AcquisitionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searcher: Option<SanitizedSearcherConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torrent_client: Option<SanitizedTorrentClientConfig>,
}

/// Sanitized searcher config (API key redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSearcherConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub api_key_configured: bool,
}

/// Sanitized torrent client config (password redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTorrentClientConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub password_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            logging: config.logging.clone(),
            tracking: config.tracking.clone(),
            scheduler: config.scheduler.clone(),
            library: config.library.clone(),
            tracks: config.tracks.clone(),
            acquisition: config.acquisition.clone(),
            searcher: config.searcher.as_ref().map(|s| SanitizedSearcherConfig {
                backend: match s.backend {
                    SearcherBackend::Jackett => "jackett".to_string(),
                },
                url: s.jackett.as_ref().map(|j| j.url.clone()),
                api_key_configured: s
                    .jackett
                    .as_ref()
                    .map(|j| !j.api_key.is_empty())
                    .unwrap_or(false),
            }),
            torrent_client: config
                .torrent_client
                .as_ref()
                .map(|tc| SanitizedTorrentClientConfig {
                    backend: match tc.backend {
                        TorrentClientBackend::QBittorrent => "qbittorrent".to_string(),
                    },
                    url: tc.qbittorrent.as_ref().map(|q| q.url.clone()),
                    password_configured: tc
                        .qbittorrent
                        .as_ref()
                        .map(|q| !q.password.is_empty())
                        .unwrap_or(false),
                }),
        }
    }
}
