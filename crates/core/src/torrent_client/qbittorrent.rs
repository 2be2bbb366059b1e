//! qBittorrent torrent client implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::QBittorrentConfig;
use crate::metrics;

use super::torrent_parser::parse_torrent;
use super::{AddTorrentRequest, AddTorrentResult, TorrentClient, TorrentClientError};

const DEFAULT_FILENAME: &str = "torrent.torrent";

/// qBittorrent Web API client.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Set once the cookie jar holds a session (cleared on 403).
    authenticated: RwLock<bool>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| TorrentClientError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            authenticated: RwLock::new(false),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Login; the session cookie is kept by the client's cookie jar.
    async fn login(&self) -> Result<(), TorrentClientError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self.client.post(&url).form(&params).send().await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            *self.authenticated.write().await = true;
            Ok(())
        } else if body.contains("Fails.") || status == StatusCode::FORBIDDEN {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), TorrentClientError> {
        if *self.authenticated.read().await {
            return Ok(());
        }
        self.login().await
    }

    /// POST the upload form. Retries once after re-login if the session expired.
    async fn upload(&self, request: &AddTorrentRequest) -> Result<(), TorrentClientError> {
        self.ensure_authenticated().await?;

        let url = format!("{}/api/v2/torrents/add", self.base_url());
        let response = self
            .client
            .post(&url)
            .multipart(build_form(request)?)
            .send()
            .await?;

        let response = if response.status() == StatusCode::FORBIDDEN {
            warn!("qBittorrent session expired, re-authenticating");
            *self.authenticated.write().await = false;
            self.login().await?;

            // A multipart form is consumed by send, so build it again
            self.client
                .post(&url)
                .multipart(build_form(request)?)
                .send()
                .await?
        } else {
            response
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }
        if body.contains("Fails.") {
            return Err(TorrentClientError::InvalidTorrent(
                "qBittorrent rejected the torrent".to_string(),
            ));
        }
        Ok(())
    }
}

fn build_form(request: &AddTorrentRequest) -> Result<multipart::Form, TorrentClientError> {
    let file_part = multipart::Part::bytes(request.data.clone())
        .file_name(
            request
                .filename
                .clone()
                .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
        )
        .mime_str("application/x-bittorrent")
        .map_err(|e| TorrentClientError::InvalidTorrent(e.to_string()))?;

    let mut form = multipart::Form::new().part("torrents", file_part);

    if let Some(path) = &request.save_path {
        form = form.text("savepath", path.clone());
    }
    if let Some(category) = &request.category {
        form = form.text("category", category.clone());
    }

    Ok(form)
}

fn record_request(started: Instant, ok: bool) {
    metrics::EXTERNAL_SERVICE_DURATION
        .with_label_values(&["qbittorrent", "add_torrent"])
        .observe(started.elapsed().as_secs_f64());
    metrics::EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[
            "qbittorrent",
            "add_torrent",
            if ok { "success" } else { "error" },
        ])
        .inc();
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        // The add endpoint does not echo the hash, read it from the file instead
        let metadata = parse_torrent(&request.data)
            .map_err(|e| TorrentClientError::InvalidTorrent(e.to_string()))?;

        let started = Instant::now();
        let result = self.upload(&request).await;
        record_request(started, result.is_ok());
        result?;

        info!(
            name = %metadata.name,
            info_hash = %metadata.info_hash,
            save_path = ?request.save_path,
            "Torrent added to qBittorrent"
        );

        Ok(AddTorrentResult {
            info_hash: Some(metadata.info_hash),
            name: Some(metadata.name),
        })
    }
}
