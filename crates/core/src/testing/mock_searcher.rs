//! Mock searcher for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::searcher::{SearchError, SearchHit, Searcher};

/// Mock implementation of the Searcher trait.
///
/// Every search returns the configured hits unfiltered, like an indexer
/// that matched loosely. Torrent downloads are served from a link map.
#[derive(Debug, Default)]
pub struct MockSearcher {
    results: RwLock<Vec<SearchHit>>,
    torrents: RwLock<HashMap<String, Vec<u8>>>,
    searches: RwLock<Vec<String>>,
    /// If set, the next search fails with this error.
    next_error: RwLock<Option<SearchError>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hits returned by subsequent searches.
    pub async fn set_results(&self, results: Vec<SearchHit>) {
        *self.results.write().await = results;
    }

    /// Serve `data` for downloads of `link`.
    pub async fn set_torrent(&self, link: impl Into<String>, data: Vec<u8>) {
        self.torrents.write().await.insert(link.into(), data);
    }

    /// Queries searched so far, in order.
    pub async fn recorded_searches(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        self.searches.write().await.push(query.to_string());
        Ok(self.results.read().await.clone())
    }

    async fn fetch_torrent(&self, link: &str) -> Result<Vec<u8>, SearchError> {
        self.torrents
            .read()
            .await
            .get(link)
            .cloned()
            .ok_or_else(|| SearchError::ApiError(format!("HTTP 404 Not Found: {}", link)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use chrono::Utc;

    #[tokio::test]
    async fn test_search_records_queries() {
        let searcher = MockSearcher::new();
        searcher
            .set_results(vec![fixtures::search_hit("t/1", "Show", Utc::now())])
            .await;

        assert_eq!(searcher.search("first").await.unwrap().len(), 1);
        searcher.search("second").await.unwrap();

        assert_eq!(searcher.recorded_searches().await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_error_injection() {
        let searcher = MockSearcher::new();
        searcher
            .set_next_error(SearchError::ConnectionFailed("test error".into()))
            .await;

        assert!(searcher.search("test").await.is_err());
        // Error should be consumed
        assert!(searcher.search("test").await.is_ok());
        assert_eq!(searcher.search_count().await, 1);
    }

    #[tokio::test]
    async fn test_fetch_torrent() {
        let searcher = MockSearcher::new();
        searcher.set_torrent("http://x/1", vec![1, 2]).await;

        assert_eq!(searcher.fetch_torrent("http://x/1").await.unwrap(), vec![1, 2]);
        assert!(searcher.fetch_torrent("http://x/2").await.is_err());
    }
}
