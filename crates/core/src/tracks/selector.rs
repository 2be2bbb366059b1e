//! Picks one video, audio and subtitle pattern out of a multi-track release.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::config::TrackConfig;

use super::priority::PriorityMatcher;

/// Chosen glob patterns, one per track kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiTrackSelection {
    /// Video pattern, empty when the release has no video track.
    pub video: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

impl MultiTrackSelection {
    /// More than one track kind was found, so the release needs muxing.
    pub fn is_multi_track(&self) -> bool {
        let present = [
            !self.video.is_empty(),
            self.audio.is_some(),
            self.subtitle.is_some(),
        ];
        present.iter().filter(|p| **p).count() > 1
    }
}

/// Track selection rules built from [`TrackConfig`].
#[derive(Debug, Clone)]
pub struct TrackSelector {
    video_suffix: String,
    audio_suffix: String,
    subtitle_suffix: String,
    audio_priorities: PriorityMatcher,
    subtitle_priorities: PriorityMatcher,
}

impl TrackSelector {
    pub fn new(config: &TrackConfig) -> Self {
        Self {
            video_suffix: suffix(&config.video_extension),
            audio_suffix: suffix(&config.audio_extension),
            subtitle_suffix: suffix(&config.subtitle_extension),
            audio_priorities: PriorityMatcher::new(config.audio_priorities.as_slice()),
            subtitle_priorities: PriorityMatcher::new(config.subtitle_priorities.as_slice()),
        }
    }

    /// Reduce `dir/*.ext` patterns to one pattern per track kind.
    pub fn select<S: AsRef<str>>(&self, patterns: &[S]) -> MultiTrackSelection {
        MultiTrackSelection {
            video: self.select_video(patterns),
            audio: select_sidecar(patterns, &self.audio_suffix, &self.audio_priorities),
            subtitle: select_sidecar(patterns, &self.subtitle_suffix, &self.subtitle_priorities),
        }
    }

    /// Shortest video pattern, first one on ties.
    fn select_video<S: AsRef<str>>(&self, patterns: &[S]) -> String {
        patterns
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| has_suffix(p, &self.video_suffix))
            .min_by_key(|p| p.chars().count())
            .map(str::to_string)
            .unwrap_or_default()
    }
}

/// Best-scored sidecar pattern. English tracks are never picked.
fn select_sidecar<S: AsRef<str>>(
    patterns: &[S],
    suffix: &str,
    priorities: &PriorityMatcher,
) -> Option<String> {
    let mut candidates: Vec<&str> = patterns
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| has_suffix(p, suffix))
        .filter(|p| !p.to_lowercase().contains("eng"))
        .collect();

    // Stable: equal scores keep input order
    candidates.sort_by_key(|p| Reverse(priorities.score(p)));
    candidates.first().map(|p| p.to_string())
}

fn suffix(extension: &str) -> String {
    format!(".{}", extension.trim_start_matches('.').to_lowercase())
}

fn has_suffix(pattern: &str, suffix: &str) -> bool {
    pattern.to_lowercase().ends_with(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(audio: &[&str], subtitles: &[&str]) -> TrackSelector {
        TrackSelector::new(&TrackConfig {
            audio_priorities: audio.iter().map(|s| s.to_string()).collect(),
            subtitle_priorities: subtitles.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
    }

    #[test]
    fn test_audio_weighting() {
        let selector = selector(&["Alpha", "Beta", "Gamma"], &[]);
        let selection = selector.select(&["Show/Alpha/*.mka", "Show/Gamma/*.mka"]);
        assert_eq!(selection.audio.as_deref(), Some("Show/Gamma/*.mka"));
    }

    #[test]
    fn test_unmatched_candidates_keep_input_order() {
        let selector = selector(&["Alpha"], &["Full"]);
        let patterns = ["Show/Z/*.mka", "Show/A/*.mka", "Show/Signs/*.ass", "Show/Songs/*.ass"];
        let selection = selector.select(&patterns);
        assert_eq!(selection.audio.as_deref(), Some("Show/Z/*.mka"));
        assert_eq!(selection.subtitle.as_deref(), Some("Show/Signs/*.ass"));
    }

    #[test]
    fn test_matched_beats_unmatched() {
        let selector = selector(&[], &["Full"]);
        let selection = selector.select(&["Show/Signs/*.ass", "Show/Full/*.ass"]);
        assert_eq!(selection.subtitle.as_deref(), Some("Show/Full/*.ass"));
    }

    #[test]
    fn test_english_tracks_excluded() {
        let selector = selector(&["ENG"], &["eng"]);
        let selection = selector.select(&[
            "Show/Sound/ENG/*.mka",
            "Show/Sound/JAP/*.mka",
            "Show/Subs/English/*.ass",
        ]);
        assert_eq!(selection.audio.as_deref(), Some("Show/Sound/JAP/*.mka"));
        assert_eq!(selection.subtitle, None);
    }

    #[test]
    fn test_only_english_candidate_yields_none() {
        let selector = selector(&[], &[]);
        let selection = selector.select(&["Show/*.mkv", "Show/Eng/*.mka"]);
        assert_eq!(selection.audio, None);
        assert_eq!(selection.video, "Show/*.mkv");
    }

    #[test]
    fn test_video_shortest_pattern_first_on_tie() {
        let selector = selector(&[], &[]);
        let selection = selector.select(&[
            "Show/Extras/*.mkv",
            "Show/A/*.mkv",
            "Show/B/*.mkv",
            "Show/Sound/*.mka",
        ]);
        assert_eq!(selection.video, "Show/A/*.mkv");
    }

    #[test]
    fn test_empty_input() {
        let selection = selector(&[], &[]).select::<&str>(&[]);
        assert_eq!(selection, MultiTrackSelection::default());
        assert!(!selection.is_multi_track());
    }

    #[test]
    fn test_is_multi_track() {
        let video_only = MultiTrackSelection {
            video: "Show/*.mkv".to_string(),
            ..Default::default()
        };
        assert!(!video_only.is_multi_track());

        let with_audio = MultiTrackSelection {
            audio: Some("Show/Sound/*.mka".to_string()),
            ..video_only.clone()
        };
        assert!(with_audio.is_multi_track());

        let sidecars_only = MultiTrackSelection {
            video: String::new(),
            audio: Some("a/*.mka".to_string()),
            subtitle: Some("s/*.ass".to_string()),
        };
        assert!(sidecars_only.is_multi_track());
    }

    #[test]
    fn test_custom_extensions() {
        let selector = TrackSelector::new(&TrackConfig {
            video_extension: "mp4".to_string(),
            audio_extension: ".ac3".to_string(),
            subtitle_extension: "SRT".to_string(),
            ..Default::default()
        });
        let selection = selector.select(&["R/*.mp4", "R/Audio/*.ac3", "R/Subs/*.srt", "R/*.mkv"]);
        assert_eq!(selection.video, "R/*.mp4");
        assert_eq!(selection.audio.as_deref(), Some("R/Audio/*.ac3"));
        assert_eq!(selection.subtitle.as_deref(), Some("R/Subs/*.srt"));
    }
}
