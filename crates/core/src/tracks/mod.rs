//! Multi-track release handling.
//!
//! A multi-track release ships video, audio and subtitle tracks as separate
//! files that a later muxing step merges. This module reduces the files of a
//! torrent to glob patterns and picks one pattern per track kind.

mod patterns;
mod priority;
mod selector;

pub use patterns::{extract_patterns, torrent_dir_name, wildify_square_brackets};
pub use priority::{PriorityMatcher, UNMATCHED};
pub use selector::{MultiTrackSelection, TrackSelector};
