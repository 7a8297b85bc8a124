//! Play queue ordering: next/previous with wrap-around, shuffle and loop modes.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::track::Track;

/// What happens when a track finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Stop after the last track
    NoLoop,
    /// Advance, wrapping to the first track after the last
    #[default]
    LoopAll,
    /// Rewind and replay the same track
    LoopOne,
}

impl LoopMode {
    /// Cycle `NoLoop -> LoopAll -> LoopOne -> NoLoop`
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::NoLoop => Self::LoopAll,
            Self::LoopAll => Self::LoopOne,
            Self::LoopOne => Self::NoLoop,
        }
    }
}

/// Result of a "previous" request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousOutcome {
    /// Enough of the track had played; restart it instead of moving back
    Rewind,
    /// Moved to the track at this index
    Moved(usize),
    /// Queue is empty
    Empty,
}

/// Result of the current track ending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndedOutcome {
    Replay,
    Advance(usize),
    Stop,
}

/// Ordered play sequence with a current index
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    tracks: Vec<Track>,
    index: usize,
    /// Order before shuffling, restored when shuffle is turned off
    unshuffled: Option<Vec<Track>>,
}

impl PlayQueue {
    /// Create a queue positioned at `index` (clamped into range)
    #[must_use]
    pub fn new(tracks: Vec<Track>, index: usize) -> Self {
        let index = index.min(tracks.len().saturating_sub(1));
        Self {
            tracks,
            index,
            unshuffled: None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[must_use]
    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.index)
    }

    pub fn current_mut(&mut self) -> Option<&mut Track> {
        self.tracks.get_mut(self.index)
    }

    #[must_use]
    pub const fn is_shuffled(&self) -> bool {
        self.unshuffled.is_some()
    }

    /// Jump to `index`; returns it when in range
    pub fn jump(&mut self, index: usize) -> Option<usize> {
        (index < self.tracks.len()).then(|| {
            self.index = index;
            index
        })
    }

    /// Advance one track, wrapping to the start
    pub fn next(&mut self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.tracks.len();
        Some(self.index)
    }

    /// Go back one track (wrapping to the end), or rewind when more than
    /// `rewind_threshold` seconds of the current track have played.
    pub fn previous(&mut self, elapsed: f64, rewind_threshold: f64) -> PreviousOutcome {
        if self.tracks.is_empty() {
            return PreviousOutcome::Empty;
        }
        if elapsed > rewind_threshold {
            return PreviousOutcome::Rewind;
        }
        let len = self.tracks.len();
        self.index = (self.index + len - 1) % len;
        PreviousOutcome::Moved(self.index)
    }

    /// Decide what follows the current track under `loop_mode`
    pub fn on_ended(&mut self, loop_mode: LoopMode) -> EndedOutcome {
        if self.tracks.is_empty() {
            return EndedOutcome::Stop;
        }
        match loop_mode {
            LoopMode::LoopOne => EndedOutcome::Replay,
            LoopMode::NoLoop if self.index + 1 == self.tracks.len() => EndedOutcome::Stop,
            LoopMode::NoLoop | LoopMode::LoopAll => {
                self.next().map_or(EndedOutcome::Stop, EndedOutcome::Advance)
            }
        }
    }

    /// Shuffle the queue (Fisher-Yates).
    ///
    /// With `pin_current` the current track moves to the front and the rest
    /// are permuted behind it; otherwise everything is permuted and the index
    /// follows the current track.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R, pin_current: bool) {
        if self.tracks.is_empty() {
            return;
        }
        if self.unshuffled.is_none() {
            self.unshuffled = Some(self.tracks.clone());
        }

        if pin_current {
            let current = self.tracks.remove(self.index);
            self.tracks.shuffle(rng);
            self.tracks.insert(0, current);
            self.index = 0;
        } else {
            let current_id = self.tracks[self.index].id;
            self.tracks.shuffle(rng);
            self.index = self
                .tracks
                .iter()
                .position(|t| t.id == current_id)
                .unwrap_or(0);
        }
    }

    /// Restore the order from before shuffling, keeping the current track selected
    pub fn unshuffle(&mut self) {
        let Some(mut original) = self.unshuffled.take() else {
            return;
        };
        let current_id = self.current().map(|t| t.id);
        // Timetables may have been committed while shuffled; carry them over.
        for track in &mut original {
            if let Some(updated) = self.tracks.iter().find(|t| t.id == track.id) {
                track.timetable.clone_from(&updated.timetable);
            }
        }
        self.tracks = original;
        self.index = current_id
            .and_then(|id| self.tracks.iter().position(|t| t.id == id))
            .unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackInfo;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn queue(n: i64, index: usize) -> PlayQueue {
        let tracks = (0..n)
            .map(|i| Track::new(i, TrackInfo::new(format!("Song {i}"), format!("/m/{i}.mp3"))))
            .collect();
        PlayQueue::new(tracks, index)
    }

    fn ids(queue: &PlayQueue) -> Vec<i64> {
        queue.tracks().iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_next_wraps() {
        let mut q = queue(3, 1);
        assert_eq!(q.next(), Some(2));
        assert_eq!(q.next(), Some(0));
    }

    #[test]
    fn test_next_empty() {
        assert_eq!(PlayQueue::default().next(), None);
    }

    #[test]
    fn test_previous_wraps() {
        let mut q = queue(3, 0);
        assert_eq!(q.previous(1.0, 3.0), PreviousOutcome::Moved(2));
        assert_eq!(q.previous(0.0, 3.0), PreviousOutcome::Moved(1));
    }

    #[test]
    fn test_previous_rewinds_after_threshold() {
        let mut q = queue(3, 1);
        assert_eq!(q.previous(3.5, 3.0), PreviousOutcome::Rewind);
        assert_eq!(q.index(), 1);
        // Exactly at the threshold still moves back
        assert_eq!(q.previous(3.0, 3.0), PreviousOutcome::Moved(0));
    }

    #[test]
    fn test_on_ended_loop_modes() {
        let mut q = queue(2, 1);
        assert_eq!(q.on_ended(LoopMode::LoopOne), EndedOutcome::Replay);
        assert_eq!(q.on_ended(LoopMode::NoLoop), EndedOutcome::Stop);
        assert_eq!(q.on_ended(LoopMode::LoopAll), EndedOutcome::Advance(0));
        assert_eq!(q.on_ended(LoopMode::NoLoop), EndedOutcome::Advance(1));
    }

    #[test]
    fn test_loop_mode_cycle() {
        assert_eq!(LoopMode::NoLoop.next(), LoopMode::LoopAll);
        assert_eq!(LoopMode::LoopAll.next(), LoopMode::LoopOne);
        assert_eq!(LoopMode::LoopOne.next(), LoopMode::NoLoop);
    }

    #[test]
    fn test_shuffle_pinned_current_is_first() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut q = queue(8, 5);
            q.shuffle(&mut rng, true);

            assert_eq!(q.index(), 0);
            assert_eq!(q.tracks()[0].id, 5);

            let mut rest: Vec<i64> = ids(&q)[1..].to_vec();
            rest.sort_unstable();
            assert_eq!(rest, vec![0, 1, 2, 3, 4, 6, 7]);
        }
    }

    #[test]
    fn test_shuffle_unpinned_follows_current() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut q = queue(6, 2);
        q.shuffle(&mut rng, false);

        assert_eq!(q.current().map(|t| t.id), Some(2));
        let mut all = ids(&q);
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_unshuffle_restores_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut q = queue(5, 3);
        q.shuffle(&mut rng, true);
        q.next();
        let playing = q.current().map(|t| t.id);

        q.unshuffle();

        assert!(!q.is_shuffled());
        assert_eq!(ids(&q), vec![0, 1, 2, 3, 4]);
        assert_eq!(q.current().map(|t| t.id), playing);
    }

    #[test]
    fn test_unshuffle_keeps_committed_timetables() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut q = queue(3, 0);
        q.shuffle(&mut rng, true);
        if let Some(track) = q.current_mut() {
            track.timetable = Some(vec!["[1] a".into()]);
        }

        q.unshuffle();

        assert!(q.tracks()[0].has_timetable());
    }

    #[test]
    fn test_new_clamps_index() {
        assert_eq!(queue(3, 10).index(), 2);
        assert_eq!(PlayQueue::new(vec![], 4).index(), 0);
    }
}
