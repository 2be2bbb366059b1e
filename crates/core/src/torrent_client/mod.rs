//! Torrent client abstraction.
//!
//! `TorrentClient` hands downloaded .torrent files to a backend (qBittorrent).
//! `torrent_parser` reads the file listing out of .torrent data.

mod qbittorrent;
pub mod torrent_parser;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use torrent_parser::{parse_torrent, TorrentMetadata, TorrentParseError};
pub use types::*;
