mod api;
mod metrics;
mod pipeline;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use topicwatch_core::config::{expand_tilde, LogFormat, SearcherBackend, TorrentClientBackend};
use topicwatch_core::{
    load_config, validate_config, CheckScheduler, Config, JackettSearcher, QBittorrentClient,
    Searcher, SqliteTopicStore, TopicAcquirer, TopicPipeline, TopicStore, TopicTracker,
    TorrentClient, TrackingFileWatcher,
};

use api::create_router;
use pipeline::LoggingPipeline;
use state::AppState;

/// Buffer size for the TopicChanged channel
const CHANGES_BUFFER_SIZE: usize = 64;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("TOPICWATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Log format is configurable, so peek at the config before loading it for real
    let preloaded = load_config(&config_path);
    let format = preloaded
        .as_ref()
        .map(|c| c.logging.format)
        .unwrap_or_default();
    init_tracing(format);

    info!("Loading configuration from {:?}", config_path);
    let config = preloaded.with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Topic store
    let store: Arc<dyn TopicStore> = Arc::new(
        SqliteTopicStore::new(&expand_tilde(&config.database.path))
            .context("Failed to open topic store")?,
    );
    info!("Topic store initialized");

    let pipeline = build_pipeline(&config, Arc::clone(&store))?;

    // Scheduler and tracker
    let (scheduler, due_rx) = CheckScheduler::new(config.scheduler.clone(), Arc::clone(&store));
    let scheduler = Arc::new(scheduler);
    let tracker = Arc::new(TopicTracker::new(
        Arc::clone(&scheduler),
        Arc::clone(&store),
        pipeline,
    ));

    // Tracking file
    let tracking_path = config.tracking.resolved_path();
    let (changes_tx, changes_rx) = mpsc::channel(CHANGES_BUFFER_SIZE);
    let watcher = TrackingFileWatcher::new(&tracking_path, changes_tx);

    match watcher.load_initial().await {
        Ok(topics) => {
            info!(path = %tracking_path.display(), topics = topics.len(), "Tracking file loaded");
            tracker.bootstrap(topics).await;
        }
        Err(e) => warn!("Failed to read tracking file: {}", e),
    }

    let changes_handle = tracker.run_changes(changes_rx);
    let dispatch_handle = tracker.run_dispatch(due_rx);
    watcher
        .start()
        .context("Failed to watch tracking file")?;
    scheduler.start();

    // Status API
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&scheduler)));
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    watcher.stop();
    scheduler.stop();

    // In-flight checks are abandoned
    changes_handle.abort();
    dispatch_handle.abort();
    info!("Shutdown complete");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Build the acquisition pipeline, or a logging stand-in when the searcher
/// or the torrent client is not configured.
fn build_pipeline(config: &Config, store: Arc<dyn TopicStore>) -> Result<Arc<dyn TopicPipeline>> {
    // Create searcher if configured
    let searcher: Option<Arc<dyn Searcher>> = match &config.searcher {
        Some(searcher_config) => match searcher_config.backend {
            SearcherBackend::Jackett => match &searcher_config.jackett {
                Some(jackett_config) => {
                    info!("Initializing Jackett searcher at {}", jackett_config.url);
                    Some(Arc::new(
                        JackettSearcher::new(jackett_config.clone())
                            .context("Failed to create Jackett searcher")?,
                    ))
                }
                None => {
                    error!("Jackett backend selected but no jackett config provided");
                    None
                }
            },
        },
        None => {
            info!("No searcher configured");
            None
        }
    };

    // Create torrent client if configured
    let torrent_client: Option<Arc<dyn TorrentClient>> = match &config.torrent_client {
        Some(tc_config) => match tc_config.backend {
            TorrentClientBackend::QBittorrent => match &tc_config.qbittorrent {
                Some(qbit_config) => {
                    info!("Initializing qBittorrent client at {}", qbit_config.url);
                    Some(Arc::new(
                        QBittorrentClient::new(qbit_config.clone())
                            .context("Failed to create qBittorrent client")?,
                    ))
                }
                None => {
                    error!("qBittorrent backend selected but no qbittorrent config provided");
                    None
                }
            },
        },
        None => {
            info!("No torrent client configured");
            None
        }
    };

    let pipeline: Arc<dyn TopicPipeline> = match (searcher, torrent_client) {
        (Some(searcher), Some(client)) => {
            let downloads_dir = expand_tilde(&config.acquisition.downloads_dir);
            info!(downloads_dir = %downloads_dir.display(), "Acquisition pipeline enabled");
            Arc::new(TopicAcquirer::new(
                searcher,
                client,
                store,
                config.library.clone(),
                &config.tracks,
                downloads_dir,
            ))
        }
        (searcher, client) => {
            warn!(
                "Acquisition disabled (searcher: {}, torrent_client: {}), due topics are only logged",
                searcher.is_some(),
                client.is_some()
            );
            Arc::new(LoggingPipeline::new(store))
        }
    };

    Ok(pipeline)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
