//! Player orchestration: the `PlayerState` aggregate and the controller that
//! drives it from user input, transport notifications and position updates.
//!
//! The controller is synchronous; [`crate::engine::PlayerEngine`] serializes
//! access to it and performs persistence off the interaction path.

use rand::Rng;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::{DisplayConfig, FontColor, PlaybackConfig};
use crate::engine::PlayerEvent;
use crate::error::{CoreError, Result};
use crate::playback::PlayerStatus;
use crate::playlist::{EndedOutcome, LoopMode, PlayQueue, PreviousOutcome};
use crate::recording::{InputOutcome, PromptAnswer, RecordingAction, RecordingSession};
use crate::resolver::{LyricDisplayState, LyricResolver, LyricSource};
use crate::time::clamp_position;
use crate::timetable::Timetable;
use crate::track::{Track, TrackId};
use crate::tracker::PositionTracker;
use crate::transport::{MediaTransport, TransportEvent};

const LOG_TARGET: &str = "lyricsync::player";

/// Keys the player reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKey {
    Space,
    Enter,
    Left,
    Right,
    Up,
    Down,
}

impl PlayerKey {
    /// Recording map: Enter stamps, Left/Up undo, Right/Down copy, Space toggles playback
    #[must_use]
    pub const fn recording_action(self) -> RecordingAction {
        match self {
            Self::Enter => RecordingAction::Confirm,
            Self::Left | Self::Up => RecordingAction::Undo,
            Self::Right | Self::Down => RecordingAction::CopyExisting,
            Self::Space => RecordingAction::TogglePlayback,
        }
    }
}

/// A confirmed timetable waiting to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub track_id: TrackId,
    pub lines: Vec<String>,
}

/// Everything the player knows about the active track
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    pub queue: PlayQueue,
    pub lyrics: LyricDisplayState,
    pub tracker: PositionTracker,
    pub recording: RecordingSession,
    pub loop_mode: LoopMode,
    /// Color of passed lyric lines
    pub font_color: FontColor,
    /// Incremented on every track change
    pub epoch: u64,
}

impl PlayerState {
    #[must_use]
    pub fn current_track(&self) -> Option<&Track> {
        self.queue.current()
    }
}

/// Drives a [`PlayerState`] against a media transport
pub struct PlayerController {
    state: PlayerState,
    transport: Box<dyn MediaTransport>,
    resolver: LyricResolver,
    config: PlaybackConfig,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl PlayerController {
    pub fn new(
        transport: Box<dyn MediaTransport>,
        resolver: LyricResolver,
        config: PlaybackConfig,
        event_tx: broadcast::Sender<PlayerEvent>,
    ) -> Self {
        let state = PlayerState {
            loop_mode: config.loop_mode,
            ..PlayerState::default()
        };
        Self {
            state,
            transport,
            resolver,
            config,
            event_tx,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Apply display settings: highlight color and whether tracks start with auto-scroll on
    pub fn set_display(&mut self, display: &DisplayConfig) {
        self.state.font_color = display.font_color;
        let was_following = self.state.tracker.auto_scroll();
        self.state.tracker.set_auto_scroll_on_reset(display.auto_scroll);
        if was_following != display.auto_scroll {
            self.emit(PlayerEvent::AutoScrollChanged {
                enabled: display.auto_scroll,
            });
        }
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Replace the queue and start playing the track at `index`
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyQueue`] if `tracks` is empty.
    pub fn set_queue(&mut self, tracks: Vec<Track>, index: usize) -> Result<()> {
        if tracks.is_empty() {
            return Err(CoreError::EmptyQueue);
        }
        info!(target: LOG_TARGET, "Queue replaced ({} tracks)", tracks.len());
        self.state.queue = PlayQueue::new(tracks, index);
        self.load_current(true);
        Ok(())
    }

    /// Jump to the queue entry at `index`
    pub fn play_index(&mut self, index: usize) -> bool {
        if self.state.queue.jump(index).is_none() {
            return false;
        }
        self.load_current(true);
        true
    }

    /// Follow a track that is played by something else (external player).
    ///
    /// The transport is not asked to load or play; only lyrics and the
    /// tracker are switched over.
    pub fn follow_track(&mut self, track: Track, duration: f64) {
        self.state.queue = PlayQueue::new(vec![track], 0);
        self.load_current(false);
        self.state.tracker.set_duration(duration);
        self.state.tracker.set_status(PlayerStatus::Playing);
        self.emit(PlayerEvent::DurationChanged {
            duration: self.state.tracker.playback().duration,
        });
        self.emit(PlayerEvent::StatusChanged {
            status: PlayerStatus::Playing,
        });
    }

    /// Drop the active track (external player is on something outside the library)
    pub fn clear_track(&mut self) {
        self.cancel_recording();
        self.state.queue = PlayQueue::default();
        self.state.lyrics = LyricDisplayState::default();
        self.state.epoch += 1;
        self.state.tracker.reset(self.state.epoch);
        self.emit(PlayerEvent::LyricsResolved {
            epoch: self.state.epoch,
            lyrics: LyricDisplayState::default(),
        });
        self.emit(PlayerEvent::StatusChanged {
            status: PlayerStatus::Stopped,
        });
    }

    /// Switch to the queue's current track.
    ///
    /// Recording is cancelled and lyrics resolved before the new epoch starts,
    /// so no position update can observe a half-switched state.
    fn load_current(&mut self, drive_transport: bool) {
        self.cancel_recording();

        let Some(track) = self.state.queue.current().cloned() else {
            return;
        };

        self.state.lyrics = self.resolver.resolve(&track);
        self.state.epoch += 1;
        self.state.tracker.reset(self.state.epoch);

        info!(
            target: LOG_TARGET,
            "Track changed: {} (epoch {}, lyrics: {:?})",
            track.title(),
            self.state.epoch,
            self.state.lyrics.source
        );

        if drive_transport {
            self.state.tracker.set_status(PlayerStatus::Loading);
            self.transport.load(track.path());
            self.transport.play();
        }

        self.emit(PlayerEvent::TrackChanged {
            epoch: self.state.epoch,
            index: self.state.queue.index(),
            track,
        });
        self.emit(PlayerEvent::LyricsResolved {
            epoch: self.state.epoch,
            lyrics: self.state.lyrics.clone(),
        });
        self.emit(PlayerEvent::AutoScrollChanged {
            enabled: self.state.tracker.auto_scroll(),
        });
        if drive_transport {
            self.emit(PlayerEvent::StatusChanged {
                status: PlayerStatus::Loading,
            });
        }
    }

    /// Advance to the next track (wrapping)
    pub fn next(&mut self) {
        if self.state.queue.next().is_some() {
            self.load_current(true);
        }
    }

    /// Go back a track, or rewind when enough of this one has played
    pub fn previous(&mut self) {
        let elapsed = self.state.tracker.current_time();
        match self
            .state
            .queue
            .previous(elapsed, self.config.rewind_threshold_secs)
        {
            PreviousOutcome::Rewind => self.seek(0.0),
            PreviousOutcome::Moved(_) => self.load_current(true),
            PreviousOutcome::Empty => {}
        }
    }

    pub fn toggle_play(&mut self) {
        if self.state.queue.is_empty() {
            return;
        }
        if !self.transport.controls_playback() {
            debug!(target: LOG_TARGET, "Transport does not control playback, ignoring toggle");
            return;
        }
        let status = if self.state.tracker.playback().is_playing() {
            self.transport.pause();
            PlayerStatus::Paused
        } else {
            self.transport.play();
            PlayerStatus::Playing
        };
        self.state.tracker.set_status(status);
        self.emit(PlayerEvent::StatusChanged { status });
    }

    /// Seek to `seconds` (clamped into the track) and refresh highlighting
    pub fn seek(&mut self, seconds: f64) {
        let target = clamp_position(seconds, self.state.tracker.playback().duration);
        self.transport.seek(target);
        self.apply_position(target);
    }

    /// Seek to a fraction of the track, as from a progress bar click
    pub fn seek_fraction(&mut self, fraction: f64) {
        let duration = self.state.tracker.playback().duration;
        if duration > 0.0 && fraction.is_finite() {
            self.seek(duration * fraction.clamp(0.0, 1.0));
        }
    }

    /// Apply a position sampled for track `epoch`; stale samples are dropped.
    pub fn update_position(&mut self, epoch: u64, time: f64) -> bool {
        if epoch != self.state.epoch {
            debug!(
                target: LOG_TARGET,
                "Dropping position {:.2}s for stale epoch {} (current {})",
                time,
                epoch,
                self.state.epoch
            );
            return false;
        }
        self.apply_position(time);
        true
    }

    fn apply_position(&mut self, time: f64) {
        let update =
            self.state
                .tracker
                .update(time, &self.state.lyrics, self.state.recording.preview());
        let epoch = self.state.epoch;

        if let Some(scroll) = update.scroll {
            self.emit(PlayerEvent::ScrollTo {
                epoch,
                line: scroll.line,
            });
        }
        self.emit(PlayerEvent::Highlight {
            epoch,
            current_time: update.current_time,
            highlight: update.highlight,
            color: self.state.font_color,
        });
    }

    /// React to a notification from the media transport
    pub fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Loaded { duration } => {
                self.state.tracker.set_duration(duration);
                self.emit(PlayerEvent::DurationChanged {
                    duration: self.state.tracker.playback().duration,
                });
                if self.state.tracker.playback().status == PlayerStatus::Loading {
                    self.state.tracker.set_status(PlayerStatus::Playing);
                    self.emit(PlayerEvent::StatusChanged {
                        status: PlayerStatus::Playing,
                    });
                }
            }
            TransportEvent::Position { time } => {
                // Positions seen before the new source loads belong to the old one
                if self.state.tracker.playback().status != PlayerStatus::Loading {
                    self.apply_position(time);
                }
            }
            TransportEvent::Played => self.set_status(PlayerStatus::Playing),
            TransportEvent::Paused => self.set_status(PlayerStatus::Paused),
            TransportEvent::Ended => self.on_ended(),
        }
    }

    fn set_status(&mut self, status: PlayerStatus) {
        if self.state.tracker.playback().status != status {
            self.state.tracker.set_status(status);
            self.emit(PlayerEvent::StatusChanged { status });
        }
    }

    fn on_ended(&mut self) {
        match self.state.queue.on_ended(self.state.loop_mode) {
            EndedOutcome::Replay => {
                self.seek(0.0);
                self.transport.play();
            }
            EndedOutcome::Advance(_) => self.load_current(true),
            EndedOutcome::Stop => {
                self.cancel_recording();
                self.state.tracker.set_status(PlayerStatus::Stopped);
                self.emit(PlayerEvent::StatusChanged {
                    status: PlayerStatus::Stopped,
                });
                self.emit(PlayerEvent::QueueEnded);
            }
        }
    }

    /// Dispatch a key through the active key map
    pub fn handle_key(&mut self, key: PlayerKey) {
        if self.state.recording.is_active() {
            self.handle_recording_input(key.recording_action());
            return;
        }
        match key {
            PlayerKey::Left => self.previous(),
            PlayerKey::Right => self.next(),
            PlayerKey::Space => self.toggle_play(),
            PlayerKey::Up | PlayerKey::Down | PlayerKey::Enter => {}
        }
    }

    fn handle_recording_input(&mut self, action: RecordingAction) {
        let current_time = self.state.tracker.current_time();
        match self.state.recording.handle_input(action, current_time) {
            InputOutcome::Progress { recorded, total } => {
                self.emit(PlayerEvent::RecordingProgress { recorded, total });
                self.apply_position(current_time);
            }
            InputOutcome::AwaitingConfirmation { total } => {
                info!(target: LOG_TARGET, "All {} lines stamped, awaiting confirmation", total);
                self.emit(PlayerEvent::RecordingProgress {
                    recorded: total,
                    total,
                });
                self.emit(PlayerEvent::RecordingPrompt { total });
            }
            InputOutcome::TogglePlayback => self.toggle_play(),
            InputOutcome::Ignored => {}
        }
    }

    /// Start a recording session on the current track and rewind to 0.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyQueue`] without a current track,
    /// [`CoreError::NoLyrics`] when it has no lines to align, or
    /// [`CoreError::RecordingActive`] if a session is running.
    pub fn start_recording(&mut self) -> Result<TrackId> {
        let track_id = self.state.current_track().ok_or(CoreError::EmptyQueue)?.id;
        let lyrics = &self.state.lyrics;
        self.state.recording.start(
            Some(track_id),
            lyrics.line_count(),
            lyrics.timestamps.clone(),
        )?;

        info!(
            target: LOG_TARGET,
            "Recording started for track {} ({} lines)",
            track_id,
            lyrics.line_count()
        );
        self.emit(PlayerEvent::RecordingStarted {
            track_id,
            line_count: self.state.lyrics.line_count(),
        });
        self.seek(0.0);
        Ok(track_id)
    }

    /// Abort the recording session without committing
    pub fn cancel_recording(&mut self) -> bool {
        let cancelled = self.state.recording.cancel();
        if cancelled {
            info!(target: LOG_TARGET, "Recording cancelled");
            self.emit(PlayerEvent::RecordingCancelled);
        }
        cancelled
    }

    /// Answer the completion prompt.
    ///
    /// On confirm the new timetable becomes active immediately, playback
    /// rewinds to 0, and the lines to persist are returned.
    pub fn answer_prompt(&mut self, confirm: bool) -> Option<CommitRequest> {
        match self.state.recording.answer_prompt(confirm) {
            PromptAnswer::Commit {
                track_id,
                timestamps,
            } => {
                let timetable =
                    Timetable::from_parts(&timestamps, self.state.lyrics.lyric_lines.as_slice());
                if !timetable.is_monotonic() {
                    warn!(
                        target: LOG_TARGET,
                        "Committing timetable with out-of-order timestamps"
                    );
                }
                let lines = timetable.encode();

                self.state.lyrics.timestamps = timestamps;
                self.state.lyrics.source = LyricSource::Timetable;
                if let Some(track) = self.state.queue.current_mut() {
                    if Some(track.id) == track_id {
                        track.timetable = Some(lines.clone());
                    }
                }
                self.emit(PlayerEvent::LyricsResolved {
                    epoch: self.state.epoch,
                    lyrics: self.state.lyrics.clone(),
                });
                self.seek(0.0);

                track_id.map(|track_id| CommitRequest { track_id, lines })
            }
            PromptAnswer::Discarded => {
                info!(target: LOG_TARGET, "Recorded timetable discarded");
                self.emit(PlayerEvent::RecordingDiscarded);
                self.apply_position(self.state.tracker.current_time());
                None
            }
            PromptAnswer::NotPending => None,
        }
    }

    /// The user scrolled the lyric view by hand
    pub fn user_scrolled(&mut self) {
        if self.state.tracker.auto_scroll() {
            self.state.tracker.user_scrolled();
            self.emit(PlayerEvent::AutoScrollChanged { enabled: false });
        }
    }

    pub fn enable_auto_scroll(&mut self) {
        if !self.state.tracker.auto_scroll() {
            self.state.tracker.enable_auto_scroll();
            self.emit(PlayerEvent::AutoScrollChanged { enabled: true });
        }
    }

    /// Toggle shuffle; the current track keeps playing either way
    pub fn toggle_shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.state.queue.is_shuffled() {
            self.state.queue.unshuffle();
        } else {
            self.state
                .queue
                .shuffle(rng, self.config.shuffle_pins_current);
        }
        self.emit(PlayerEvent::ShuffleChanged {
            shuffled: self.state.queue.is_shuffled(),
        });
    }

    /// Cycle `NoLoop -> LoopAll -> LoopOne`
    pub fn cycle_loop_mode(&mut self) -> LoopMode {
        self.state.loop_mode = self.state.loop_mode.next();
        self.emit(PlayerEvent::LoopModeChanged {
            mode: self.state.loop_mode,
        });
        self.state.loop_mode
    }
}
