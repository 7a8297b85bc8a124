//! Lyric source resolution: persisted timetable first, embedded lyrics second.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::metadata::{split_lyric_lines, MetadataSource};
use crate::timetable::Timetable;
use crate::track::Track;

const LOG_TARGET: &str = "lyricsync::resolver";

/// Where the displayed lyric lines came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LyricSource {
    /// Decoded from the track's persisted timetable
    Timetable,
    /// Split from the embedded lyrics tag, without timestamps
    Embedded,
    /// No lyrics available
    #[default]
    None,
}

/// Lyric lines shown for the current track.
///
/// When `timestamps` is non-empty it runs parallel to `lyric_lines`:
/// `timestamps[i]` is the reveal time of `lyric_lines[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricDisplayState {
    pub lyric_lines: Vec<String>,
    pub timestamps: Vec<f64>,
    pub source: LyricSource,
}

impl LyricDisplayState {
    /// Whether recording a timetable is possible (needs at least one line)
    #[must_use]
    pub fn can_record(&self) -> bool {
        !self.lyric_lines.is_empty()
    }

    #[must_use]
    pub fn has_timestamps(&self) -> bool {
        !self.timestamps.is_empty()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lyric_lines.len()
    }
}

/// Resolves the lyric display state for a track
pub struct LyricResolver {
    metadata: Arc<dyn MetadataSource>,
}

impl LyricResolver {
    /// Create a new resolver reading embedded lyrics from `metadata`
    pub fn new(metadata: Arc<dyn MetadataSource>) -> Self {
        Self { metadata }
    }

    /// Resolve lyrics for a track.
    ///
    /// A malformed timetable is treated as absent and falls back to the
    /// embedded lyrics; an unreadable file yields no lines.
    #[must_use]
    pub fn resolve(&self, track: &Track) -> LyricDisplayState {
        if let Some(state) = Self::from_timetable(track) {
            return state;
        }
        self.from_embedded(track)
    }

    fn from_timetable(track: &Track) -> Option<LyricDisplayState> {
        let lines = track.timetable.as_ref().filter(|lines| !lines.is_empty())?;

        match Timetable::decode(lines.as_slice()) {
            Ok(timetable) if !timetable.is_empty() => {
                info!(
                    target: LOG_TARGET,
                    "Using timetable for {} ({} lines)",
                    track.title(),
                    timetable.len()
                );
                Some(LyricDisplayState {
                    timestamps: timetable.times(),
                    lyric_lines: timetable.lyric_lines(),
                    source: LyricSource::Timetable,
                })
            }
            Ok(_) => {
                debug!(target: LOG_TARGET, "Timetable for {} has only blank lines", track.title());
                None
            }
            Err(e) => {
                warn!(
                    target: LOG_TARGET,
                    "Ignoring malformed timetable for {}: {}",
                    track.title(),
                    e
                );
                None
            }
        }
    }

    fn from_embedded(&self, track: &Track) -> LyricDisplayState {
        let lyrics = match self.metadata.read_tags(track.path()) {
            Ok(tags) => tags.lyrics.unwrap_or_default(),
            Err(e) => {
                warn!(
                    target: LOG_TARGET,
                    "Failed to read lyrics for {} via {}: {}",
                    track.title(),
                    self.metadata.name(),
                    e
                );
                return LyricDisplayState::default();
            }
        };

        let lyric_lines = split_lyric_lines(&lyrics);
        if lyric_lines.is_empty() {
            info!(target: LOG_TARGET, "No lyrics found for {}", track.title());
            return LyricDisplayState::default();
        }

        info!(
            target: LOG_TARGET,
            "Using embedded lyrics for {} ({} lines, no timetable)",
            track.title(),
            lyric_lines.len()
        );
        LyricDisplayState {
            lyric_lines,
            timestamps: Vec::new(),
            source: LyricSource::Embedded,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::error::{CoreError, Result};
    use crate::metadata::{MetadataSource, TrackTags};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    /// Metadata source backed by a fixed path -> lyrics map
    #[derive(Default)]
    pub struct FakeMetadata {
        pub lyrics: HashMap<PathBuf, String>,
    }

    impl FakeMetadata {
        pub fn with(mut self, path: &str, lyrics: &str) -> Self {
            self.lyrics.insert(PathBuf::from(path), lyrics.to_string());
            self
        }
    }

    impl MetadataSource for FakeMetadata {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn read_tags(&self, path: &Path) -> Result<TrackTags> {
            match self.lyrics.get(path) {
                Some(text) => Ok(TrackTags {
                    lyrics: Some(text.clone()),
                    ..TrackTags::default()
                }),
                None => Err(CoreError::MetadataRead {
                    path: path.to_path_buf(),
                    reason: "no such file".into(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FakeMetadata;
    use super::*;
    use crate::track::TrackInfo;

    fn resolver() -> LyricResolver {
        LyricResolver::new(Arc::new(
            FakeMetadata::default()
                .with("/m/plain.mp3", "first\nsecond\r\nthird")
                .with("/m/empty.mp3", ""),
        ))
    }

    fn track(path: &str) -> Track {
        Track::new(1, TrackInfo::new("Song", path))
    }

    #[test]
    fn test_resolve_timetable() {
        let t = track("/m/plain.mp3").with_timetable(vec![
            "[1] a".into(),
            "[2.5] b".into(),
            String::new(),
        ]);
        let state = resolver().resolve(&t);

        assert_eq!(state.source, LyricSource::Timetable);
        assert_eq!(state.lyric_lines, vec!["a", "b"]);
        assert_eq!(state.timestamps, vec![1.0, 2.5]);
        assert_eq!(state.timestamps.len(), state.lyric_lines.len());
        assert!(state.can_record());
    }

    #[test]
    fn test_resolve_embedded_without_timetable() {
        let state = resolver().resolve(&track("/m/plain.mp3"));

        assert_eq!(state.source, LyricSource::Embedded);
        assert_eq!(state.lyric_lines, vec!["first", "second", "third"]);
        assert!(state.timestamps.is_empty());
    }

    #[test]
    fn test_resolve_empty_timetable_falls_back() {
        let state = resolver().resolve(&track("/m/plain.mp3").with_timetable(vec![]));
        assert_eq!(state.source, LyricSource::Embedded);
    }

    #[test]
    fn test_resolve_malformed_timetable_falls_back() {
        let t = track("/m/plain.mp3").with_timetable(vec!["garbage".into()]);
        let state = resolver().resolve(&t);

        assert_eq!(state.source, LyricSource::Embedded);
        assert_eq!(state.lyric_lines.len(), 3);
    }

    #[test]
    fn test_resolve_metadata_failure_yields_nothing() {
        let state = resolver().resolve(&track("/m/missing.mp3"));

        assert_eq!(state, LyricDisplayState::default());
        assert!(!state.can_record());
    }

    #[test]
    fn test_resolve_empty_lyrics_tag() {
        let state = resolver().resolve(&track("/m/empty.mp3"));
        assert_eq!(state.source, LyricSource::None);
        assert!(!state.can_record());
    }
}
