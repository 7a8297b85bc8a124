//! Recording session state machine for manual timetable alignment.
//!
//! ```text
//! Idle --start--> Recording --(pending == lines)--> Committing --answer--> Idle
//!                     |                                  |
//!                     +------------cancel----------------+--> Idle
//! ```

use crate::error::{CoreError, Result};
use crate::timetable::centiseconds;
use crate::track::TrackId;

/// Recording session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    #[default]
    Idle,
    /// Accepting inputs
    Recording,
    /// Every line has a timestamp; waiting for the user to confirm or decline
    Committing,
}

/// Discrete inputs understood while recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingAction {
    /// Stamp the next line with the current playback time
    Confirm,
    /// Drop the last stamped time
    Undo,
    /// Reuse the existing timestamp for the next line
    CopyExisting,
    /// Play/pause; does not touch pending timestamps
    TogglePlayback,
}

/// What an input did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Pending timestamps changed; `recorded` of `total` lines are stamped
    Progress { recorded: usize, total: usize },
    /// Every line is stamped; the session now waits for confirmation
    AwaitingConfirmation { total: usize },
    /// Caller should toggle playback
    TogglePlayback,
    /// Nothing changed
    Ignored,
}

/// Outcome of answering the completion prompt
#[derive(Debug, Clone, PartialEq)]
pub enum PromptAnswer {
    /// User accepted; these timestamps should be committed
    Commit {
        track_id: Option<TrackId>,
        timestamps: Vec<f64>,
    },
    /// User declined; nothing is persisted
    Discarded,
    /// No prompt was pending
    NotPending,
}

/// A manual-alignment recording session.
///
/// `pending.len() <= line_count` holds at all times.
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    state: RecordingState,
    pending: Vec<f64>,
    line_count: usize,
    reference: Vec<f64>,
    track_id: Option<TrackId>,
}

impl RecordingSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> RecordingState {
        self.state
    }

    /// Whether a session is in progress (recording or awaiting confirmation)
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self.state, RecordingState::Idle)
    }

    #[must_use]
    pub fn pending(&self) -> &[f64] {
        &self.pending
    }

    #[must_use]
    pub const fn track_id(&self) -> Option<TrackId> {
        self.track_id
    }

    /// Pending timestamps to preview, once at least one has been recorded
    #[must_use]
    pub fn preview(&self) -> Option<&[f64]> {
        (self.is_active() && !self.pending.is_empty()).then_some(self.pending.as_slice())
    }

    /// Begin recording against `line_count` lyric lines.
    ///
    /// `reference` holds the existing timestamps (possibly empty) used by
    /// [`RecordingAction::CopyExisting`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoLyrics`] when there is nothing to align, or
    /// [`CoreError::RecordingActive`] when a session is already running.
    pub fn start(
        &mut self,
        track_id: Option<TrackId>,
        line_count: usize,
        reference: Vec<f64>,
    ) -> Result<()> {
        if self.is_active() {
            return Err(CoreError::RecordingActive);
        }
        if line_count == 0 {
            return Err(CoreError::NoLyrics);
        }

        self.state = RecordingState::Recording;
        self.pending.clear();
        self.line_count = line_count;
        self.reference = reference;
        self.track_id = track_id;
        Ok(())
    }

    /// Dispatch one input at playback time `current_time`.
    pub fn handle_input(&mut self, action: RecordingAction, current_time: f64) -> InputOutcome {
        if self.state != RecordingState::Recording {
            return InputOutcome::Ignored;
        }

        let changed = match action {
            RecordingAction::Confirm => {
                self.pending.push(centiseconds(current_time));
                true
            }
            RecordingAction::Undo => self.pending.pop().is_some(),
            RecordingAction::CopyExisting => match self.reference.get(self.pending.len()) {
                Some(&time) => {
                    self.pending.push(time);
                    true
                }
                None => false,
            },
            RecordingAction::TogglePlayback => return InputOutcome::TogglePlayback,
        };

        if self.pending.len() == self.line_count {
            self.state = RecordingState::Committing;
            return InputOutcome::AwaitingConfirmation {
                total: self.line_count,
            };
        }

        if changed {
            InputOutcome::Progress {
                recorded: self.pending.len(),
                total: self.line_count,
            }
        } else {
            InputOutcome::Ignored
        }
    }

    /// Answer the completion prompt. The session returns to idle either way.
    pub fn answer_prompt(&mut self, confirm: bool) -> PromptAnswer {
        if self.state != RecordingState::Committing {
            return PromptAnswer::NotPending;
        }

        let answer = if confirm {
            PromptAnswer::Commit {
                track_id: self.track_id,
                timestamps: std::mem::take(&mut self.pending),
            }
        } else {
            PromptAnswer::Discarded
        };
        self.reset();
        answer
    }

    /// Abort the session without committing. Returns whether one was active.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.reset();
        was_active
    }

    fn reset(&mut self) {
        self.state = RecordingState::Idle;
        self.pending.clear();
        self.line_count = 0;
        self.reference.clear();
        self.track_id = None;
    }
}
