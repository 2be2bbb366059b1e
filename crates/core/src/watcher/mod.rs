//! Tracking file observation.
//!
//! - `hasher`: content fingerprints
//! - `detector`: per-topic change detection over raw file content
//! - `tracking_file`: filesystem watch feeding the detector

mod detector;
mod hasher;
mod tracking_file;

pub use detector::ChangeDetector;
pub use hasher::content_hash;
pub use tracking_file::{TrackingFileWatcher, WatchError};
