//! Torrent layout validation and destination classification.

mod classifier;
mod types;

pub use classifier::LayoutClassifier;
pub use types::{DestinationDecision, LayoutError, MediaCategory, TorrentFileEntry};
