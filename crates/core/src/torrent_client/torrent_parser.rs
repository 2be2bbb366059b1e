//! Torrent file parser - extracts file listings from .torrent files.
//!
//! Uses librqbit-core to parse bencoded .torrent data and extract
//! the file listing (paths and sizes) without needing to download anything.

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};
use thiserror::Error;

use crate::layout::TorrentFileEntry;

/// Errors that can occur when parsing torrent files.
#[derive(Debug, Error)]
pub enum TorrentParseError {
    #[error("Failed to parse torrent: {0}")]
    ParseError(String),

    #[error("Empty torrent (no files)")]
    EmptyTorrent,
}

/// Parsed metadata of a .torrent file.
#[derive(Debug, Clone)]
pub struct TorrentMetadata {
    /// Root name (folder name for multi-file, file name for single-file).
    pub name: String,
    /// Lowercase hex info hash.
    pub info_hash: String,
    pub files: Vec<TorrentFileEntry>,
}

/// Parse a .torrent file.
///
/// Multi-file torrents list their files under the root folder
/// (`name/sub/file.mkv`); a single-file torrent yields one root-level entry.
/// Offsets are the cumulative lengths of the preceding files.
pub fn parse_torrent(bytes: &[u8]) -> Result<TorrentMetadata, TorrentParseError> {
    let torrent: TorrentMetaV1Owned =
        torrent_from_bytes(bytes).map_err(|e| TorrentParseError::ParseError(e.to_string()))?;

    let info = &torrent.info;

    let root_name = info
        .name
        .as_ref()
        .map(|b| bytes_to_string(b.as_ref()))
        .unwrap_or_else(|| "unknown".to_string());

    let mut sized_paths: Vec<(String, u64)> = Vec::new();

    if let Some(ref files) = info.files {
        for file in files {
            let mut path_parts = vec![root_name.clone()];
            for part in &file.path {
                path_parts.push(bytes_to_string(part.as_ref()));
            }
            sized_paths.push((path_parts.join("/"), file.length));
        }
    } else if let Some(length) = info.length {
        sized_paths.push((root_name.clone(), length));
    }

    if sized_paths.is_empty() {
        return Err(TorrentParseError::EmptyTorrent);
    }

    Ok(TorrentMetadata {
        name: root_name,
        info_hash: torrent.info_hash.as_string(),
        files: with_offsets(sized_paths),
    })
}

fn with_offsets(sized_paths: Vec<(String, u64)>) -> Vec<TorrentFileEntry> {
    let mut offset = 0u64;
    sized_paths
        .into_iter()
        .map(|(path, length)| {
            let mut entry = TorrentFileEntry::new(path, length);
            entry.offset = offset;
            offset += length;
            entry
        })
        .collect()
}

/// Convert bytes to a UTF-8 string, replacing invalid sequences.
fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal bencoded torrent with the given info dictionary body.
    fn torrent(info: &str) -> Vec<u8> {
        format!("d8:announce9:udp://x:14:info{info}e").into_bytes()
    }

    #[test]
    fn test_parse_invalid_torrent() {
        assert!(parse_torrent(b"not a valid torrent").is_err());
        assert!(parse_torrent(b"").is_err());
    }

    #[test]
    fn test_parse_single_file_torrent() {
        let bytes = torrent("d6:lengthi1024e4:name9:Movie.mkv12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaae");

        let meta = parse_torrent(&bytes).unwrap();
        assert_eq!(meta.name, "Movie.mkv");
        assert_eq!(meta.info_hash.len(), 40);
        assert_eq!(meta.files, vec![TorrentFileEntry::new("Movie.mkv", 1024)]);
    }

    #[test]
    fn test_parse_multi_file_torrent_offsets() {
        let bytes = torrent(
            "d5:filesld6:lengthi100e4:pathl7:ep1.mkveed6:lengthi50e4:pathl5:Sound7:ep1.mkaeee\
             4:name4:Show12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaae",
        );

        let files = parse_torrent(&bytes).unwrap().files;
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "Show/ep1.mkv");
        assert_eq!(files[0].offset, 0);
        assert_eq!(files[1].path, "Show/Sound/ep1.mka");
        assert_eq!(files[1].name, "ep1.mka");
        assert_eq!(files[1].length, 50);
        assert_eq!(files[1].offset, 100);
    }

    #[test]
    fn test_bytes_to_string_invalid_utf8() {
        let invalid = vec![0xff, 0xfe, 0x68, 0x65, 0x6c, 0x6c, 0x6f];
        assert!(bytes_to_string(&invalid).contains("hello"));
    }
}
