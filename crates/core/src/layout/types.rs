//! Types for torrent layout classification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One file inside a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentFileEntry {
    /// File name (last path segment).
    pub name: String,
    /// Path inside the torrent. Segments may be separated by `/` or `\`.
    pub path: String,
    /// Size in bytes.
    pub length: u64,
    /// Byte offset of the file within the torrent's concatenated payload.
    pub offset: u64,
}

impl TorrentFileEntry {
    /// Entry for `path` with the name taken from its last segment and a zero offset.
    pub fn new(path: impl Into<String>, length: u64) -> Self {
        let path = path.into();
        let name = path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            name,
            path,
            length,
            offset: 0,
        }
    }

    /// Non-empty path segments, the last one being the file name.
    pub fn segments(&self) -> Vec<&str> {
        self.path
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Library category a torrent is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCategory {
    Movie,
    TvShow,
    /// Multi-track TV release waiting to be muxed.
    RawTvShow,
}

impl MediaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Movie => "movie",
            MediaCategory::TvShow => "tv_show",
            MediaCategory::RawTvShow => "raw_tv_show",
        }
    }
}

/// Where a torrent goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationDecision {
    pub category: MediaCategory,
    /// Save path handed to the torrent client.
    pub client_save_path: String,
    /// Library path of the category.
    pub library_category_path: String,
}

/// Reasons a torrent layout is rejected. All are terminal for the torrent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Torrent should contain only *.mkv or *.mp4 files: {file}")]
    UnsupportedLayout { file: String },

    #[error("torrent should contain no more than one directory with *.mkv files in it: {file}")]
    TooDeeplyNested { file: String },

    #[error("MP4 torrents should contain files in the root folder only: {file}")]
    Mp4MustBeInRoot { file: String },

    #[error("Torrent should not mix *.mkv and *.mp4 files")]
    MixedContainerFormats,

    #[error("Torrent contains no files")]
    EmptyTorrent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_name_from_path() {
        assert_eq!(TorrentFileEntry::new("Show/ep1.mkv", 1).name, "ep1.mkv");
        assert_eq!(TorrentFileEntry::new("Show\\ep1.mkv", 1).name, "ep1.mkv");
        assert_eq!(TorrentFileEntry::new("Movie.mkv", 1).name, "Movie.mkv");
    }

    #[test]
    fn test_segments_mixed_separators() {
        let entry = TorrentFileEntry::new("Show\\Season 1/ep1.mkv", 1);
        assert_eq!(entry.segments(), vec!["Show", "Season 1", "ep1.mkv"]);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            LayoutError::MixedContainerFormats.to_string(),
            "Torrent should not mix *.mkv and *.mp4 files"
        );
        let err = LayoutError::Mp4MustBeInRoot {
            file: "Show/ep1.mp4".to_string(),
        };
        assert!(err.to_string().starts_with("MP4 torrents should contain files in the root folder only"));
    }
}
