//! External player position polling.

use crate::client::{ExternalPosition, PlayerQuery};
use crate::error::{ExternalPlayerError, Result};
use async_trait::async_trait;
use lyricsync_core::{CoreError, PlayerEngine, PositionSource, RepeatingTask, SourceKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const LOG_TARGET: &str = "lyricsync::external_player";

/// Track the external player was last seen on
#[derive(Debug, Clone, PartialEq, Eq)]
struct SeenTrack {
    title: String,
    artist: String,
    /// Whether the catalog had it (positions are only applied if so)
    in_library: bool,
}

#[derive(Debug, Default)]
struct PollState {
    seen: Option<SeenTrack>,
    /// A failure has already been reported during this run
    failure_notified: bool,
}

struct PollerInner {
    engine: Arc<PlayerEngine>,
    player: Arc<dyn PlayerQuery>,
    state: Mutex<PollState>,
}

impl PollerInner {
    /// One poll cycle; returns whether a position update was applied
    async fn poll_once(&self) -> bool {
        // Sampled before the query so a track change during it invalidates the result
        let epoch = self.engine.current_epoch().await;

        let reply = match self.player.query_position().await {
            Ok(reply) => reply,
            Err(e) => {
                self.report_failure(&e).await;
                return false;
            }
        };

        let Some(position) = reply else {
            debug!(target: LOG_TARGET, "External player idle");
            return false;
        };

        match self.follow(&position).await {
            Ok(Some(epoch_after_change)) => {
                self.engine
                    .update_position(epoch_after_change, position.position)
                    .await
            }
            Ok(None) => {
                let in_library = self
                    .state
                    .lock()
                    .await
                    .seen
                    .as_ref()
                    .is_some_and(|seen| seen.in_library);
                in_library && self.engine.update_position(epoch, position.position).await
            }
            Err(e) => {
                self.report_failure(&e).await;
                false
            }
        }
    }

    /// Switch the engine when the player moved to another track.
    ///
    /// Returns the new epoch if a library track became current.
    async fn follow(&self, position: &ExternalPosition) -> Result<Option<u64>> {
        let mut state = self.state.lock().await;
        let unchanged = state
            .seen
            .as_ref()
            .is_some_and(|seen| seen.title == position.title && seen.artist == position.artist);
        if unchanged {
            return Ok(None);
        }

        info!(
            target: LOG_TARGET,
            "External player switched to {} - {}", position.artist, position.title
        );
        let found = self
            .engine
            .follow_external_track(&position.title, &position.artist, position.time)
            .await?;

        state.seen = Some(SeenTrack {
            title: position.title.clone(),
            artist: position.artist.clone(),
            in_library: found.is_some(),
        });
        drop(state);

        if found.is_some() {
            Ok(Some(self.engine.current_epoch().await))
        } else {
            Ok(None)
        }
    }

    /// Notify on the first failure of a run; later ones are only logged
    async fn report_failure(&self, e: &ExternalPlayerError) {
        let mut state = self.state.lock().await;
        if state.failure_notified {
            debug!(target: LOG_TARGET, "Poll failed again: {}", e);
            return;
        }
        state.failure_notified = true;
        drop(state);

        warn!(target: LOG_TARGET, "Poll failed: {}", e);
        self.engine
            .notify(format!("Could not read the external player: {e}"));
    }
}

/// Polls an external player on a fixed interval and drives the engine.
pub struct ExternalPlayerPoller {
    inner: Arc<PollerInner>,
    poll_interval: Duration,
    cancel_token: CancellationToken,
}

impl ExternalPlayerPoller {
    /// Create a new external player poller
    ///
    /// # Arguments
    /// * `engine` - Player engine to update with positions
    /// * `player` - External player client
    /// * `poll_interval_ms` - Polling interval in milliseconds
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    pub fn new(
        engine: Arc<PlayerEngine>,
        player: Arc<dyn PlayerQuery>,
        poll_interval_ms: u64,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                engine,
                player,
                state: Mutex::new(PollState::default()),
            }),
            poll_interval: Duration::from_millis(poll_interval_ms.max(1)),
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Start polling in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                error!(target: LOG_TARGET, "External player poller stopped with error: {}", e);
            }
        })
    }

    /// Run a single poll cycle; returns whether a position was applied
    pub async fn poll_once(&self) -> bool {
        self.inner.poll_once().await
    }
}

#[async_trait]
impl PositionSource for ExternalPlayerPoller {
    fn kind(&self) -> SourceKind {
        SourceKind::ExternalPlayer
    }

    fn name(&self) -> &'static str {
        "External player"
    }

    fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    async fn run(&self) -> std::result::Result<(), CoreError> {
        info!(
            target: LOG_TARGET,
            "Polling external player every {}ms",
            self.poll_interval.as_millis()
        );
        *self.inner.state.lock().await = PollState::default();

        let inner = Arc::clone(&self.inner);
        let task = RepeatingTask::start(self.poll_interval, Some(&self.cancel_token), move || {
            let inner = Arc::clone(&inner);
            async move {
                inner.poll_once().await;
            }
        });

        self.cancel_token.cancelled().await;
        task.join().await;
        info!(target: LOG_TARGET, "External player poller shutting down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyricsync_core::{
        MetadataSource, NullTransport, PlaybackConfig, PlayerEvent, SqliteCatalog, TrackInfo,
        TrackRepository, TrackTags,
    };
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::broadcast;

    struct Lyrics;

    impl MetadataSource for Lyrics {
        fn name(&self) -> &'static str {
            "lyrics"
        }

        fn read_tags(&self, _path: &Path) -> lyricsync_core::Result<TrackTags> {
            Ok(TrackTags {
                lyrics: Some("a\nb\nc".into()),
                ..TrackTags::default()
            })
        }
    }

    enum Reply {
        Playing(&'static str, f64),
        Idle,
        Broken,
    }

    /// Answers queries from a script, then repeats the last reply
    struct ScriptedPlayer {
        replies: std::sync::Mutex<VecDeque<Reply>>,
        queries: AtomicUsize,
    }

    impl ScriptedPlayer {
        fn new(replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                replies: std::sync::Mutex::new(replies.into()),
                queries: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PlayerQuery for ScriptedPlayer {
        async fn query_position(&self) -> Result<Option<ExternalPosition>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let mut replies = self.replies.lock().unwrap();
            let reply = if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().map(|r| match r {
                    Reply::Playing(title, position) => Reply::Playing(*title, *position),
                    Reply::Idle => Reply::Idle,
                    Reply::Broken => Reply::Broken,
                })
            };
            match reply {
                Some(Reply::Playing(title, position)) => Ok(Some(ExternalPosition {
                    title: title.to_string(),
                    artist: "Band".to_string(),
                    time: 100.0,
                    position,
                })),
                Some(Reply::Broken) => Err(ExternalPlayerError::CommandNotConfigured { which: "query" }),
                Some(Reply::Idle) | None => Ok(None),
            }
        }

        async fn seek_to(&self, _position: f64) -> Result<()> {
            Ok(())
        }
    }

    async fn engine() -> Arc<PlayerEngine> {
        let catalog = SqliteCatalog::open_in_memory().await.unwrap();
        catalog
            .upsert(&TrackInfo::new("Song", "/m/song.mp3").with_artist("Band"))
            .await
            .unwrap();
        catalog
            .upsert(&TrackInfo::new("Other", "/m/other.mp3").with_artist("Band"))
            .await
            .unwrap();
        PlayerEngine::new(
            Box::new(NullTransport::new()),
            Arc::new(Lyrics),
            Arc::new(catalog),
            PlaybackConfig::default(),
        )
    }

    fn poller(engine: &Arc<PlayerEngine>, player: Arc<ScriptedPlayer>) -> ExternalPlayerPoller {
        ExternalPlayerPoller::new(Arc::clone(engine), player, 500, None)
    }

    fn notifications(rx: &mut broadcast::Receiver<PlayerEvent>) -> usize {
        let mut count = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, PlayerEvent::Notification { .. }) {
                count += 1;
            }
        }
        count
    }

    #[tokio::test]
    async fn test_follows_track_and_applies_positions() {
        let engine = engine().await;
        let player = ScriptedPlayer::new(vec![Reply::Playing("Song", 10.0), Reply::Playing("Song", 20.0)]);
        let poller = poller(&engine, player);

        assert!(poller.poll_once().await);
        let state = engine.state().await;
        assert_eq!(state.current_track().map(|t| t.title().to_string()), Some("Song".into()));
        assert!((state.tracker.current_time() - 10.0).abs() < f64::EPSILON);
        assert!((state.tracker.playback().duration - 100.0).abs() < f64::EPSILON);
        let epoch = state.epoch;

        assert!(poller.poll_once().await);
        let state = engine.state().await;
        assert_eq!(state.epoch, epoch);
        assert!((state.tracker.current_time() - 20.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_track_switch_starts_new_epoch() {
        let engine = engine().await;
        let player = ScriptedPlayer::new(vec![Reply::Playing("Song", 50.0), Reply::Playing("Other", 1.0)]);
        let poller = poller(&engine, player);

        poller.poll_once().await;
        let first_epoch = engine.current_epoch().await;
        poller.poll_once().await;

        let state = engine.state().await;
        assert!(state.epoch > first_epoch);
        assert_eq!(state.current_track().map(|t| t.title().to_string()), Some("Other".into()));
        assert!((state.tracker.current_time() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_unknown_track_notifies_once_and_skips_positions() {
        let engine = engine().await;
        let mut rx = engine.subscribe();
        let player = ScriptedPlayer::new(vec![Reply::Playing("Missing", 5.0)]);
        let poller = poller(&engine, player);

        assert!(!poller.poll_once().await);
        assert!(!poller.poll_once().await);

        assert_eq!(notifications(&mut rx), 1);
        let state = engine.state().await;
        assert!(state.current_track().is_none());
        assert!(state.lyrics.lyric_lines.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_failures_notify_once() {
        let engine = engine().await;
        let mut rx = engine.subscribe();
        let player = ScriptedPlayer::new(vec![
            Reply::Broken,
            Reply::Broken,
            Reply::Idle,
            Reply::Broken,
            Reply::Playing("Song", 3.0),
        ]);
        let poller = poller(&engine, player);

        for _ in 0..4 {
            assert!(!poller.poll_once().await);
        }
        assert_eq!(notifications(&mut rx), 1);

        // Polling keeps going after failures
        assert!(poller.poll_once().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_until_stopped() {
        let engine = engine().await;
        let player = ScriptedPlayer::new(vec![Reply::Idle]);
        let poller = Arc::new(poller(&engine, Arc::clone(&player)));

        let handle = Arc::clone(&poller).start();
        tokio::time::sleep(Duration::from_millis(1250)).await;
        poller.stop();
        handle.await.unwrap();

        let polled = player.queries.load(Ordering::SeqCst);
        assert!(polled >= 3, "expected at least 3 polls, got {polled}");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(player.queries.load(Ordering::SeqCst), polled);
    }
}
