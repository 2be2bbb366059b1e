//! Glob patterns describing the file groups of a torrent.

use std::path::Path;

use crate::layout::TorrentFileEntry;

/// One `dir/*.ext` pattern per distinct (directory, extension) pair, in first-seen order.
///
/// Root-level files produce `*.ext`.
pub fn extract_patterns(files: &[TorrentFileEntry]) -> Vec<String> {
    let mut patterns: Vec<String> = Vec::new();

    for file in files {
        let segments = file.segments();
        let Some((file_name, dirs)) = segments.split_last() else {
            continue;
        };

        let ext = Path::new(file_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let pattern = if dirs.is_empty() {
            format!("*{ext}")
        } else {
            format!("{}/*{ext}", dirs.join("/"))
        };

        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
    }

    patterns
}

/// Top-level folder of the torrent, if its files live in one.
pub fn torrent_dir_name(files: &[TorrentFileEntry]) -> Option<String> {
    files.iter().find_map(|file| {
        let segments = file.segments();
        (segments.len() > 1).then(|| segments[0].to_string())
    })
}

/// Replace every run of `[` / `]` with `*`, since brackets are glob syntax.
pub fn wildify_square_brackets(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut in_run = false;

    for c in pattern.chars() {
        if c == '[' || c == ']' {
            if !in_run {
                out.push('*');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> Vec<TorrentFileEntry> {
        paths.iter().map(|p| TorrentFileEntry::new(*p, 1)).collect()
    }

    #[test]
    fn test_extract_patterns_groups_by_dir_and_extension() {
        let files = files(&[
            "Show/Show - 01.mkv",
            "Show/Show - 02.mkv",
            "Show/Sound/Studio A/Show - 01.mka",
            "Show/Sound/Studio A/Show - 02.mka",
            "Show/Subs/Full/Show - 01.ass",
            "Show/Subs/Full/Show - 01.srt",
        ]);

        assert_eq!(
            extract_patterns(&files),
            vec![
                "Show/*.mkv",
                "Show/Sound/Studio A/*.mka",
                "Show/Subs/Full/*.ass",
                "Show/Subs/Full/*.srt",
            ]
        );
    }

    #[test]
    fn test_extract_patterns_normalizes_separators() {
        let files = files(&["Show\\Sound\\Show - 01.mka", "Movie.mkv", "README"]);
        assert_eq!(
            extract_patterns(&files),
            vec!["Show/Sound/*.mka", "*.mkv", "*"]
        );
    }

    #[test]
    fn test_torrent_dir_name() {
        assert_eq!(
            torrent_dir_name(&files(&["Show/Show - 01.mkv"])).as_deref(),
            Some("Show")
        );
        assert_eq!(torrent_dir_name(&files(&["Movie.mkv"])), None);
        assert_eq!(torrent_dir_name(&[]), None);
    }

    #[test]
    fn test_wildify_square_brackets() {
        assert_eq!(
            wildify_square_brackets("[Group] Show [1080p]/*.mkv"),
            "*Group* Show *1080p*/*.mkv"
        );
        assert_eq!(wildify_square_brackets("a][b/*.mka"), "a*b/*.mka");
        assert_eq!(wildify_square_brackets("plain/*.ass"), "plain/*.ass");
    }
}
