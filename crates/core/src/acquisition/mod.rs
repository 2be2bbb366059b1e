//! Topic check pipeline.
//!
//! A check searches the indexer for the topic, compares the release date
//! with the stored record, downloads the .torrent file, decides where it
//! goes and hands it to the torrent client.

mod acquirer;
mod naming;
mod types;

pub use acquirer::TopicAcquirer;
pub use naming::{torrent_file_name, transliterate};
pub use types::*;
