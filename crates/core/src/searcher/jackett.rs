//! Jackett search backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::JackettConfig;
use crate::metrics;

use super::{SearchError, SearchHit, Searcher};

/// Searches every indexer configured in Jackett at once.
pub struct JackettSearcher {
    client: Client,
    config: JackettConfig,
}

impl JackettSearcher {
    /// Create a new JackettSearcher with the given configuration.
    pub fn new(config: JackettConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SearchError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build the Jackett API URL for a search across all indexers.
    fn build_search_url(&self, query: &str) -> String {
        format!(
            "{}/api/v2.0/indexers/all/results?apikey={}&Query={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(query)
        )
    }

    async fn get_checked(&self, url: &str) -> Result<reqwest::Response, SearchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(response)
    }
}

fn record_request(operation: &str, started: Instant, ok: bool) {
    metrics::EXTERNAL_SERVICE_DURATION
        .with_label_values(&["jackett", operation])
        .observe(started.elapsed().as_secs_f64());
    metrics::EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&["jackett", operation, if ok { "success" } else { "error" }])
        .inc();
}

#[async_trait]
impl Searcher for JackettSearcher {
    fn name(&self) -> &str {
        "jackett"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let started = Instant::now();
        let url = self.build_search_url(query);
        debug!(query = %query, "Searching Jackett");

        let result = async {
            let response = self.get_checked(&url).await?;
            response
                .json::<JackettResponse>()
                .await
                .map_err(|e| SearchError::ApiError(format!("Failed to parse response: {}", e)))
        }
        .await;
        record_request("search", started, result.is_ok());
        let jackett_response = result?;

        debug!(
            query = %query,
            results = jackett_response.Results.len(),
            "Jackett search complete"
        );

        Ok(jackett_response
            .Results
            .into_iter()
            .filter_map(JackettResult::into_hit)
            .collect())
    }

    async fn fetch_torrent(&self, link: &str) -> Result<Vec<u8>, SearchError> {
        let started = Instant::now();

        let result = async {
            let response = self.get_checked(link).await?;
            let bytes = response.bytes().await?;
            Ok::<_, SearchError>(bytes.to_vec())
        }
        .await;
        record_request("fetch_torrent", started, result.is_ok());

        let bytes = result?;
        debug!(bytes = bytes.len(), "Downloaded torrent file");
        Ok(bytes)
    }
}

/// Parse Jackett's date format.
fn parse_jackett_date(date_str: &str) -> Option<DateTime<Utc>> {
    // Jackett returns dates in ISO 8601 format
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            // Try parsing without timezone
            chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

// Jackett API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    Results: Vec<JackettResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Guid: Option<String>,
    Title: String,
    Link: Option<String>,
    PublishDate: Option<String>,
}

impl JackettResult {
    /// Results without a guid cannot be matched to a topic.
    fn into_hit(self) -> Option<SearchHit> {
        Some(SearchHit {
            guid: self.Guid?,
            title: self.Title,
            link: self.Link,
            publish_date: self.PublishDate.as_deref().and_then(parse_jackett_date),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn searcher(url: &str) -> JackettSearcher {
        JackettSearcher::new(JackettConfig {
            url: url.to_string(),
            api_key: "test-key".to_string(),
            timeout_secs: 30,
        })
        .unwrap()
    }

    #[test]
    fn test_parse_jackett_date_rfc3339() {
        let date = parse_jackett_date("2024-06-15T10:30:00Z").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 6);
        assert_eq!(date.day(), 15);
    }

    #[test]
    fn test_parse_jackett_date_with_offset() {
        let date = parse_jackett_date("2024-06-15T10:30:00+02:00").unwrap();
        assert_eq!(date, parse_jackett_date("2024-06-15T08:30:00Z").unwrap());
    }

    #[test]
    fn test_parse_jackett_date_no_timezone() {
        assert!(parse_jackett_date("2024-06-15T10:30:00").is_some());
    }

    #[test]
    fn test_parse_jackett_date_invalid() {
        assert!(parse_jackett_date("invalid").is_none());
    }

    #[test]
    fn test_build_search_url() {
        let url = searcher("http://localhost:9117/").build_search_url("Аркейн S02");
        assert!(url.starts_with("http://localhost:9117/api/v2.0/indexers/all/results?"));
        assert!(url.contains("apikey=test-key"));
        assert!(url.contains("Query=%D0%90%D1%80%D0%BA%D0%B5%D0%B9%D0%BD%20S02"));
    }

    #[test]
    fn test_response_conversion() {
        let body = r#"{
            "Results": [
                {
                    "Guid": "https://tracker/t/1",
                    "Title": "Show S01 [1080p]",
                    "Link": "http://localhost:9117/dl/1.torrent",
                    "PublishDate": "2024-11-09T12:00:00Z",
                    "Seeders": 12
                },
                {"Title": "No guid"}
            ]
        }"#;

        let response: JackettResponse = serde_json::from_str(body).unwrap();
        let hits: Vec<SearchHit> = response
            .Results
            .into_iter()
            .filter_map(JackettResult::into_hit)
            .collect();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].guid, "https://tracker/t/1");
        assert_eq!(hits[0].link.as_deref(), Some("http://localhost:9117/dl/1.torrent"));
        assert_eq!(hits[0].publish_date.unwrap().day(), 9);
    }
}
