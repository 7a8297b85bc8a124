use serde::{Deserialize, Serialize};

/// Status of the media transport for the active track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    #[default]
    Stopped,
    Loading,
    Playing,
    Paused,
}

impl PlayerStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback state of the active track.
///
/// One instance exists per track; a track change replaces it with a fresh
/// state carrying a new `epoch`, so updates sampled for an earlier track can
/// be recognized and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// Current playback position in seconds
    pub current_time: f64,
    /// Track length in seconds (0 until the transport reports it)
    pub duration: f64,
    pub status: PlayerStatus,
    /// Track-change counter this state belongs to
    pub epoch: u64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PlaybackState {
    /// Fresh state for the track identified by `epoch`
    #[must_use]
    pub const fn new(epoch: u64) -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            status: PlayerStatus::Stopped,
            epoch,
        }
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        matches!(self.status, PlayerStatus::Playing)
    }

    /// Fraction of the track elapsed in `[0, 1]`, or `None` when the duration is unknown
    #[must_use]
    pub fn progress(&self) -> Option<f64> {
        if self.duration.is_finite() && self.duration > 0.0 {
            Some((self.current_time / self.duration).clamp(0.0, 1.0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_state_default() {
        let state = PlaybackState::default();
        assert_eq!(state.status, PlayerStatus::Stopped);
        assert!(state.current_time.abs() < f64::EPSILON);
        assert!(state.duration.abs() < f64::EPSILON);
        assert_eq!(state.epoch, 0);
        assert!(!state.is_playing());
    }

    #[test]
    fn test_progress() {
        let mut state = PlaybackState::new(3);
        assert_eq!(state.progress(), None);

        state.duration = 200.0;
        state.current_time = 50.0;
        assert_eq!(state.progress(), Some(0.25));

        state.current_time = 400.0;
        assert_eq!(state.progress(), Some(1.0));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PlayerStatus::Playing.to_string(), "playing");
        assert_eq!(PlayerStatus::Loading.as_str(), "loading");
    }
}
