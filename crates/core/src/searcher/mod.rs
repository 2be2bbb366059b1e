//! Torrent search abstraction.
//!
//! This module provides a `Searcher` trait for looking up tracked topics on
//! an indexer aggregator and downloading their `.torrent` files.

mod jackett;
mod types;

pub use jackett::JackettSearcher;
pub use types::*;
