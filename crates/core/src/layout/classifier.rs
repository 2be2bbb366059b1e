//! Torrent layout classifier.
//!
//! Accepted layouts:
//! - `.mkv` files in the root or in a single folder
//! - `.mp4` files in the root only
//!
//! Several files, or one file named like an episode (`S01E01`), make a TV
//! show; a single other file is a movie.

use std::path::Path;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::config::{CategoryPaths, LibraryConfig};

use super::types::{DestinationDecision, LayoutError, MediaCategory, TorrentFileEntry};

static EPISODE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)S\d{1,2}E\d{1,2}").unwrap());

/// Validates torrent layouts and maps them to library destinations.
#[derive(Debug, Clone)]
pub struct LayoutClassifier {
    library: LibraryConfig,
}

impl LayoutClassifier {
    pub fn new(library: LibraryConfig) -> Self {
        Self { library }
    }

    /// Validate `files` and decide where the torrent goes.
    ///
    /// Deterministic and free of I/O.
    pub fn classify(&self, files: &[TorrentFileEntry]) -> Result<DestinationDecision, LayoutError> {
        if files.is_empty() {
            return Err(LayoutError::EmptyTorrent);
        }

        let mut saw_mkv = false;
        let mut saw_mp4 = false;

        for file in files {
            let segments = file.segments();
            let Some((file_name, dirs)) = segments.split_last() else {
                return Err(unsupported(file));
            };

            let ext = Path::new(file_name)
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase());

            match ext.as_deref() {
                Some("mkv") => {
                    saw_mkv = true;
                    if dirs.len() > 1 {
                        return Err(LayoutError::TooDeeplyNested {
                            file: file.path.clone(),
                        });
                    }
                }
                Some("mp4") => {
                    saw_mp4 = true;
                    if !dirs.is_empty() {
                        return Err(LayoutError::Mp4MustBeInRoot {
                            file: file.path.clone(),
                        });
                    }
                }
                _ => return Err(unsupported(file)),
            }
        }

        if saw_mkv && saw_mp4 {
            return Err(LayoutError::MixedContainerFormats);
        }

        let category = match files {
            [single] if !is_episode(single) => MediaCategory::Movie,
            _ => MediaCategory::TvShow,
        };

        Ok(self.destination(category))
    }

    /// Configured destination of `category`.
    pub fn destination(&self, category: MediaCategory) -> DestinationDecision {
        let paths: &CategoryPaths = match category {
            MediaCategory::Movie => &self.library.movies,
            MediaCategory::TvShow => &self.library.tv_shows,
            MediaCategory::RawTvShow => &self.library.raw_tv_shows,
        };

        DestinationDecision {
            category,
            client_save_path: paths.client_path.clone(),
            library_category_path: paths.library_path.clone(),
        }
    }
}

fn unsupported(file: &TorrentFileEntry) -> LayoutError {
    LayoutError::UnsupportedLayout {
        file: file.path.clone(),
    }
}

fn is_episode(file: &TorrentFileEntry) -> bool {
    let name = file.segments().last().copied().unwrap_or_default();
    EPISODE_MARKER.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_marker() {
        assert!(EPISODE_MARKER.is_match("Show.s01e02.mkv"));
        assert!(EPISODE_MARKER.is_match("Show S1E2.mp4"));
        assert!(!EPISODE_MARKER.is_match("Movie.2024.1080p.mkv"));
    }

    fn classifier() -> LayoutClassifier {
        LayoutClassifier::new(LibraryConfig {
            movies: CategoryPaths::new("/qmovies", "/movies"),
            tv_shows: CategoryPaths::new("/qtv", "/tv"),
            raw_tv_shows: CategoryPaths::new("/qraw", "/raw"),
        })
    }

    fn files(paths: &[&str]) -> Vec<TorrentFileEntry> {
        paths.iter().map(|p| TorrentFileEntry::new(*p, 0)).collect()
    }

    fn classify(paths: &[&str]) -> Result<DestinationDecision, LayoutError> {
        classifier().classify(&files(paths))
    }

    #[test]
    fn test_single_mkv_movie_in_root() {
        let dest = classify(&["Movie.mkv"]).unwrap();
        assert_eq!(dest.category, MediaCategory::Movie);
        assert_eq!(dest.client_save_path, "/qmovies");
        assert_eq!(dest.library_category_path, "/movies");
    }

    #[test]
    fn test_mkv_files_in_one_folder_are_tv_show() {
        let dest = classify(&["Show/ep1.mkv", "Show/ep2.mkv"]).unwrap();
        assert_eq!(dest.category, MediaCategory::TvShow);
        assert_eq!(dest.client_save_path, "/qtv");
        assert_eq!(dest.library_category_path, "/tv");
    }

    #[test]
    fn test_single_file_with_episode_marker_is_tv_show() {
        let dest = classify(&["Show.S01E01.mkv"]).unwrap();
        assert_eq!(dest.category, MediaCategory::TvShow);

        let dest = classify(&["Arcane.s2e1.Heavy.Is.the.Crown.mkv"]).unwrap();
        assert_eq!(dest.category, MediaCategory::TvShow);
    }

    #[test]
    fn test_episode_marker_in_folder_name_does_not_count() {
        let dest = classify(&["Show.S01E01/Movie.mkv"]).unwrap();
        assert_eq!(dest.category, MediaCategory::Movie);
    }

    #[test]
    fn test_single_mp4_movie_in_root() {
        let dest = classify(&["Movie.mp4"]).unwrap();
        assert_eq!(dest.category, MediaCategory::Movie);
    }

    #[test]
    fn test_multiple_mp4_in_root_are_tv_show() {
        let dest = classify(&["Show.S01E01.mp4", "Show.S01E02.mp4"]).unwrap();
        assert_eq!(dest.category, MediaCategory::TvShow);
    }

    #[test]
    fn test_extension_case_ignored() {
        let dest = classify(&["Movie.MKV"]).unwrap();
        assert_eq!(dest.category, MediaCategory::Movie);
    }

    #[test]
    fn test_backslash_separators() {
        assert!(matches!(
            classify(&["Show\\Season1\\ep1.mkv"]),
            Err(LayoutError::TooDeeplyNested { .. })
        ));
        assert!(classify(&["Show\\ep1.mkv"]).is_ok());
    }

    #[test]
    fn test_mp4_in_folder_rejected() {
        assert!(matches!(
            classify(&["Show/ep1.mp4"]),
            Err(LayoutError::Mp4MustBeInRoot { .. })
        ));
        assert!(matches!(
            classify(&["Show/Season1/ep1.mp4"]),
            Err(LayoutError::Mp4MustBeInRoot { .. })
        ));
    }

    #[test]
    fn test_nested_mkv_rejected() {
        assert_eq!(
            classify(&["Show/Season1/ep1.mkv"]),
            Err(LayoutError::TooDeeplyNested {
                file: "Show/Season1/ep1.mkv".to_string()
            })
        );
    }

    #[test]
    fn test_mixed_formats_rejected() {
        assert_eq!(
            classify(&["Movie.mp4", "Movie.mkv"]),
            Err(LayoutError::MixedContainerFormats)
        );
    }

    #[test]
    fn test_sidecars_and_extra_files_rejected() {
        for paths in [
            &["Movie.mp4", "Movie.srt"][..],
            &["Movie.mp4", "Movie.mka"],
            &["Show/ep1.mkv", "Show/ep1.ass"],
            &["Movie.mp4", "readme.nfo"],
            &["Movie"],
        ] {
            assert!(
                matches!(classify(paths), Err(LayoutError::UnsupportedLayout { .. })),
                "{paths:?}"
            );
        }
    }

    #[test]
    fn test_first_failure_wins() {
        // The nested file is seen before the mp4 could make it a mixed torrent
        assert!(matches!(
            classify(&["A/B/ep1.mkv", "Movie.mp4"]),
            Err(LayoutError::TooDeeplyNested { .. })
        ));
    }

    #[test]
    fn test_empty_torrent() {
        assert_eq!(classify(&[]), Err(LayoutError::EmptyTorrent));
    }

    #[test]
    fn test_deterministic() {
        let files = files(&["Show/ep1.mkv", "Show/ep2.mkv"]);
        let classifier = classifier();
        assert_eq!(classifier.classify(&files), classifier.classify(&files));
    }

    #[test]
    fn test_raw_destination() {
        let dest = classifier().destination(MediaCategory::RawTvShow);
        assert_eq!(dest.client_save_path, "/qraw");
        assert_eq!(dest.library_category_path, "/raw");
    }
}
