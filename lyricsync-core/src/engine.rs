use crate::config::{DisplayConfig, FontColor, PlaybackConfig};
use crate::error::{CoreError, Result};
use crate::metadata::MetadataSource;
use crate::playback::PlayerStatus;
use crate::player::{PlayerController, PlayerKey, PlayerState};
use crate::playlist::LoopMode;
use crate::resolver::{LyricDisplayState, LyricResolver};
use crate::store::{TrackQuery, TrackRepository};
use crate::track::{Track, TrackId};
use crate::tracker::Highlight;
use crate::transport::{MediaTransport, TransportEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

const LOG_TARGET: &str = "lyricsync::engine";

/// Events emitted by the player engine
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// A new track became current
    TrackChanged {
        epoch: u64,
        index: usize,
        track: Track,
    },
    /// Lyrics for the current track were resolved or replaced
    LyricsResolved {
        epoch: u64,
        lyrics: LyricDisplayState,
    },
    /// Highlighting recomputed after a position update
    Highlight {
        epoch: u64,
        current_time: f64,
        highlight: Highlight,
        /// Color for passed lines
        color: FontColor,
    },
    /// Center this line in the lyric view
    ScrollTo { epoch: u64, line: usize },
    AutoScrollChanged { enabled: bool },
    StatusChanged { status: PlayerStatus },
    DurationChanged { duration: f64 },
    ShuffleChanged { shuffled: bool },
    LoopModeChanged { mode: LoopMode },
    /// Playback stopped after the last track
    QueueEnded,
    RecordingStarted { track_id: TrackId, line_count: usize },
    RecordingProgress { recorded: usize, total: usize },
    /// Every line is stamped; ask the user to confirm or decline
    RecordingPrompt { total: usize },
    /// A recorded timetable was persisted
    RecordingCommitted {
        track_id: TrackId,
        lines: Vec<String>,
    },
    RecordingDiscarded,
    RecordingCancelled,
    /// Message for the user (persistence or polling failures)
    Notification { message: String },
}

/// Async shell around [`PlayerController`].
///
/// Every operation runs under one mutex, so a track change completes
/// (recording cancelled, lyrics resolved) before any later position update.
pub struct PlayerEngine {
    controller: Mutex<PlayerController>,
    tracks: Arc<dyn TrackRepository>,
    event_tx: broadcast::Sender<PlayerEvent>,
    pending_commit: Mutex<Option<(TrackId, JoinHandle<()>)>>,
}

impl PlayerEngine {
    /// Create a new player engine
    pub fn new(
        transport: Box<dyn MediaTransport>,
        metadata: Arc<dyn MetadataSource>,
        tracks: Arc<dyn TrackRepository>,
        config: PlaybackConfig,
    ) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(256);
        let controller = PlayerController::new(
            transport,
            LyricResolver::new(metadata),
            config,
            event_tx.clone(),
        );

        Arc::new(Self {
            controller: Mutex::new(controller),
            tracks,
            event_tx,
            pending_commit: Mutex::new(None),
        })
    }

    /// Subscribe to player events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    /// Emit a user-facing notification
    pub fn notify(&self, message: impl Into<String>) {
        let _ = self.event_tx.send(PlayerEvent::Notification {
            message: message.into(),
        });
    }

    /// Snapshot of the player state
    pub async fn state(&self) -> PlayerState {
        self.controller.lock().await.state().clone()
    }

    /// Epoch of the current track; position samples must carry it
    pub async fn current_epoch(&self) -> u64 {
        self.controller.lock().await.state().epoch
    }

    /// Load the tracks matching `query` into the queue and play the first.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails or nothing matches.
    pub async fn load_queue(&self, query: &TrackQuery) -> Result<usize> {
        let tracks = self.tracks.find(query).await?;
        let count = tracks.len();
        self.set_queue(tracks, 0).await?;
        Ok(count)
    }

    /// Replace the queue and play the track at `index`
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyQueue`] if `tracks` is empty.
    pub async fn set_queue(&self, tracks: Vec<Track>, index: usize) -> Result<()> {
        self.controller.lock().await.set_queue(tracks, index)
    }

    pub async fn play_index(&self, index: usize) -> bool {
        self.controller.lock().await.play_index(index)
    }

    pub async fn next(&self) {
        self.controller.lock().await.next();
    }

    pub async fn previous(&self) {
        self.controller.lock().await.previous();
    }

    pub async fn toggle_play(&self) {
        self.controller.lock().await.toggle_play();
    }

    pub async fn seek(&self, seconds: f64) {
        self.controller.lock().await.seek(seconds);
    }

    pub async fn seek_fraction(&self, fraction: f64) {
        self.controller.lock().await.seek_fraction(fraction);
    }

    pub async fn handle_key(&self, key: PlayerKey) {
        self.controller.lock().await.handle_key(key);
    }

    pub async fn on_transport_event(&self, event: TransportEvent) {
        self.controller.lock().await.on_transport_event(event);
    }

    /// Apply a position sampled for track `epoch`; returns false when stale
    pub async fn update_position(&self, epoch: u64, time: f64) -> bool {
        self.controller.lock().await.update_position(epoch, time)
    }

    pub async fn user_scrolled(&self) {
        self.controller.lock().await.user_scrolled();
    }

    pub async fn enable_auto_scroll(&self) {
        self.controller.lock().await.enable_auto_scroll();
    }

    /// Apply `[display]` settings (highlight color, starting auto-scroll state)
    pub async fn set_display(&self, display: &DisplayConfig) {
        self.controller.lock().await.set_display(display);
    }

    pub async fn toggle_shuffle(&self) {
        let mut controller = self.controller.lock().await;
        controller.toggle_shuffle(&mut rand::rng());
    }

    pub async fn cycle_loop_mode(&self) -> LoopMode {
        self.controller.lock().await.cycle_loop_mode()
    }

    /// Start recording on the current track.
    ///
    /// Waits for an in-flight timetable write on the same track first.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no current track, it has no lyric lines,
    /// or a session is already active.
    pub async fn start_recording(&self) -> Result<TrackId> {
        let track_id = self
            .controller
            .lock()
            .await
            .state()
            .current_track()
            .map(|t| t.id)
            .ok_or(CoreError::EmptyQueue)?;

        self.wait_for_commit(track_id).await;
        self.controller.lock().await.start_recording()
    }

    /// Abort the active recording session
    pub async fn stop_recording(&self) -> bool {
        self.controller.lock().await.cancel_recording()
    }

    /// Answer the recording completion prompt.
    ///
    /// A confirmed timetable is persisted in the background; a failed write
    /// is reported as a notification and the in-memory timetable is kept.
    pub async fn answer_prompt(&self, confirm: bool) {
        let Some(commit) = self.controller.lock().await.answer_prompt(confirm) else {
            return;
        };

        let tracks = Arc::clone(&self.tracks);
        let event_tx = self.event_tx.clone();
        let track_id = commit.track_id;

        let handle = tokio::spawn(async move {
            match tracks.set_timetable(commit.track_id, &commit.lines).await {
                Ok(()) => {
                    info!(
                        target: LOG_TARGET,
                        "Timetable saved for track {} ({} lines)",
                        commit.track_id,
                        commit.lines.len()
                    );
                    let _ = event_tx.send(PlayerEvent::RecordingCommitted {
                        track_id: commit.track_id,
                        lines: commit.lines,
                    });
                }
                Err(e) => {
                    warn!(
                        target: LOG_TARGET,
                        "Failed to save timetable for track {}: {}",
                        commit.track_id,
                        e
                    );
                    let _ = event_tx.send(PlayerEvent::Notification {
                        message: format!("Could not save the timetable: {e}"),
                    });
                }
            }
        });

        let previous = self.pending_commit.lock().await.replace((track_id, handle));
        if let Some((_, previous)) = previous {
            let _ = previous.await;
        }
    }

    /// Wait for a pending timetable write on `track_id`, if any
    async fn wait_for_commit(&self, track_id: TrackId) {
        let pending = {
            let mut slot = self.pending_commit.lock().await;
            match slot.take() {
                Some((id, handle)) if id == track_id => Some(handle),
                other => {
                    *slot = other;
                    None
                }
            }
        };
        if let Some(handle) = pending {
            let _ = handle.await;
        }
    }

    /// Wait for every pending timetable write
    pub async fn flush(&self) {
        let pending = self.pending_commit.lock().await.take();
        if let Some((_, handle)) = pending {
            let _ = handle.await;
        }
    }

    /// Switch to the library track an external player reports.
    ///
    /// Returns the matched track id, or `None` when the track is not in the
    /// catalog (lyrics are cleared and a notification is sent).
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog lookup fails.
    pub async fn follow_external_track(
        &self,
        title: &str,
        artist: &str,
        duration: f64,
    ) -> Result<Option<TrackId>> {
        let query = TrackQuery::TitleArtist {
            title: title.to_string(),
            artist: artist.to_string(),
        };
        let found = self.tracks.find_one(&query).await?;

        let mut controller = self.controller.lock().await;
        if let Some(track) = found {
            let id = track.id;
            controller.follow_track(track, duration);
            Ok(Some(id))
        } else {
            info!(target: LOG_TARGET, "{} - {} is not in the library", artist, title);
            controller.clear_track();
            drop(controller);
            self.notify(format!("\"{title}\" is not in the library"));
            Ok(None)
        }
    }
}
