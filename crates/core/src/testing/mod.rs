//! Testing utilities and mock implementations.
//!
//! Mocks of the external service traits let the acquisition pipeline and
//! the tracker run end-to-end without an indexer or a torrent client.
//!
//! # Example
//!
//! ```rust,ignore
//! use topicwatch_core::testing::{fixtures, MockSearcher, MockTorrentClient};
//!
//! let searcher = MockSearcher::new();
//! searcher.set_results(vec![fixtures::search_hit("t/1", "Show S01", date)]).await;
//! searcher
//!     .set_torrent(fixtures::link_for("t/1"), fixtures::torrent_bytes("Show", &[("ep1.mkv", 1)]))
//!     .await;
//! ```

mod mock_searcher;
mod mock_torrent_client;
mod recording_pipeline;

pub use mock_searcher::MockSearcher;
pub use mock_torrent_client::{MockTorrentClient, RecordedAddTorrent};
pub use recording_pipeline::RecordingPipeline;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Utc};

    use crate::searcher::SearchHit;

    /// Download link used for a guid by [`search_hit`].
    pub fn link_for(guid: &str) -> String {
        format!("http://jackett.test/dl/{}.torrent", guid.replace('/', "_"))
    }

    /// A search hit for `guid` with a download link.
    pub fn search_hit(guid: &str, title: &str, publish_date: DateTime<Utc>) -> SearchHit {
        SearchHit {
            guid: guid.to_string(),
            title: title.to_string(),
            link: Some(link_for(guid)),
            publish_date: Some(publish_date),
        }
    }

    /// Tracking file content for `(type, query, guid)` triples.
    pub fn tracking_json(topics: &[(&str, &str, &str)]) -> String {
        let entries: Vec<serde_json::Value> = topics
            .iter()
            .map(|(kind, query, guid)| {
                serde_json::json!({
                    "type": kind,
                    "subsOnly": false,
                    "query": query,
                    "guid": guid,
                })
            })
            .collect();
        serde_json::Value::Array(entries).to_string()
    }

    const PIECE_LENGTH: u64 = 16384;

    /// Bencoded multi-file torrent rooted at `name`.
    ///
    /// File paths are relative to the root and use `/` separators.
    pub fn torrent_bytes(name: &str, files: &[(&str, u64)]) -> Vec<u8> {
        let total: u64 = files.iter().map(|(_, len)| len).sum();
        let pieces = total.div_ceil(PIECE_LENGTH).max(1) as usize;

        let mut info = Vec::new();
        info.extend_from_slice(b"d5:filesl");
        for (path, length) in files {
            info.extend_from_slice(format!("d6:lengthi{length}e4:pathl").as_bytes());
            for part in path.split('/') {
                push_str(&mut info, part);
            }
            info.extend_from_slice(b"ee");
        }
        info.push(b'e');
        push_str(&mut info, "name");
        push_str(&mut info, name);
        info.extend_from_slice(format!("12:piece lengthi{PIECE_LENGTH}e").as_bytes());
        push_str(&mut info, "pieces");
        info.extend_from_slice(format!("{}:", pieces * 20).as_bytes());
        info.extend(vec![b'p'; pieces * 20]);
        info.push(b'e');

        let mut out = Vec::new();
        out.extend_from_slice(b"d8:announce");
        push_str(&mut out, "udp://tracker.test:80");
        out.extend_from_slice(b"4:info");
        out.extend_from_slice(&info);
        out.push(b'e');
        out
    }

    fn push_str(out: &mut Vec<u8>, s: &str) {
        out.extend_from_slice(format!("{}:", s.len()).as_bytes());
        out.extend_from_slice(s.as_bytes());
    }
}
