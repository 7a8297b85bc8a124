//! Playback position tracking and lyric highlighting.

use crate::playback::{PlaybackState, PlayerStatus};
use crate::resolver::LyricDisplayState;

/// How "passed" lines were decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightMode {
    /// Timestamps from the active timetable
    Exact,
    /// Proportional estimate from elapsed time and track duration
    #[default]
    Estimated,
    /// Pending timestamps of an active recording session
    Preview,
}

/// Per-line "passed" flags for one position update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlight {
    pub mode: HighlightMode,
    pub passed: Vec<bool>,
}

impl Highlight {
    /// Index of the last passed line
    #[must_use]
    pub fn last_passed(&self) -> Option<usize> {
        self.passed.iter().rposition(|&p| p)
    }

    /// Indices of all passed lines, ascending
    #[must_use]
    pub fn passed_indices(&self) -> Vec<usize> {
        self.passed
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| p.then_some(i))
            .collect()
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.passed.iter().filter(|&&p| p).count()
    }
}

/// Request to scroll the lyric view so `line` sits in the vertical center
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub line: usize,
}

/// Result of applying one position update
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerUpdate {
    pub current_time: f64,
    pub highlight: Highlight,
    pub scroll: Option<ScrollRequest>,
}

/// Exact rule: line `i` is passed iff `timestamps[i]` exists and is before `current_time`.
#[must_use]
pub fn passed_exact(line_count: usize, timestamps: &[f64], current_time: f64) -> Vec<bool> {
    (0..line_count)
        .map(|i| timestamps.get(i).is_some_and(|&t| t < current_time))
        .collect()
}

/// Estimated rule: line `i` is passed iff `i < line_count * (current_time / duration)`.
///
/// Assumes lines are evenly spread over the track. Nothing passes while the
/// duration is unknown.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn passed_estimated(line_count: usize, current_time: f64, duration: f64) -> Vec<bool> {
    if !duration.is_finite() || duration <= 0.0 {
        return vec![false; line_count];
    }
    let threshold = line_count as f64 * (current_time / duration);
    (0..line_count).map(|i| (i as f64) < threshold).collect()
}

/// Tracks the playback position of the active track and derives highlighting.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    playback: PlaybackState,
    auto_scroll: bool,
    /// Auto-scroll state every track starts with
    auto_scroll_on_reset: bool,
    highlight: Highlight,
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            playback: PlaybackState::default(),
            auto_scroll: true,
            auto_scroll_on_reset: true,
            highlight: Highlight::default(),
        }
    }

    /// Choose whether tracks start with auto-scroll on (the default) or off
    pub fn set_auto_scroll_on_reset(&mut self, enabled: bool) {
        self.auto_scroll_on_reset = enabled;
        self.auto_scroll = enabled;
    }

    /// Replace the playback state for a new track.
    ///
    /// Time goes back to 0, highlighting is cleared and auto-scroll returns
    /// to its configured starting state (enabled unless turned off).
    pub fn reset(&mut self, epoch: u64) {
        self.playback = PlaybackState::new(epoch);
        self.highlight = Highlight::default();
        self.auto_scroll = self.auto_scroll_on_reset;
    }

    #[must_use]
    pub const fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    #[must_use]
    pub const fn current_time(&self) -> f64 {
        self.playback.current_time
    }

    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.playback.epoch
    }

    #[must_use]
    pub const fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    #[must_use]
    pub const fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.playback.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
    }

    pub fn set_status(&mut self, status: PlayerStatus) {
        self.playback.status = status;
    }

    /// The user scrolled the lyric view by hand; stop following playback.
    pub fn user_scrolled(&mut self) {
        self.auto_scroll = false;
    }

    /// Explicitly resume following playback.
    pub fn enable_auto_scroll(&mut self) {
        self.auto_scroll = true;
    }

    /// Apply a position update and recompute highlighting.
    ///
    /// `preview` carries the pending timestamps of an active recording
    /// session; when it is non-empty it replaces the display timestamps.
    pub fn update(
        &mut self,
        current_time: f64,
        lyrics: &LyricDisplayState,
        preview: Option<&[f64]>,
    ) -> TrackerUpdate {
        if current_time.is_finite() {
            self.playback.current_time = current_time.max(0.0);
        }
        self.highlight = self.compute(lyrics, preview);

        let scroll = if self.auto_scroll {
            self.highlight
                .last_passed()
                .map(|line| ScrollRequest { line })
        } else {
            None
        };

        TrackerUpdate {
            current_time: self.playback.current_time,
            highlight: self.highlight.clone(),
            scroll,
        }
    }

    fn compute(&self, lyrics: &LyricDisplayState, preview: Option<&[f64]>) -> Highlight {
        let line_count = lyrics.line_count();
        let time = self.playback.current_time;

        match preview {
            Some(pending) if !pending.is_empty() => Highlight {
                mode: HighlightMode::Preview,
                passed: passed_exact(line_count, pending, time),
            },
            _ if lyrics.has_timestamps() => Highlight {
                mode: HighlightMode::Exact,
                passed: passed_exact(line_count, &lyrics.timestamps, time),
            },
            _ => Highlight {
                mode: HighlightMode::Estimated,
                passed: passed_estimated(line_count, time, self.playback.duration),
            },
        }
    }
}
