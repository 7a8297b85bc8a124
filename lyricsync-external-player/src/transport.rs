//! Media transport that forwards seeks to the external player.

use crate::client::PlayerQuery;
use lyricsync_core::MediaTransport;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// [`MediaTransport`] for when a separate application owns audio output.
///
/// Only seeks reach the external player; load/play/pause are ignored since
/// the user drives those in the player itself. Position and duration come
/// from the poller, so this transport only remembers the last seek.
pub struct ExternalTransport {
    player: Arc<dyn PlayerQuery>,
    position: f64,
}

impl ExternalTransport {
    #[must_use]
    pub fn new(player: Arc<dyn PlayerQuery>) -> Self {
        Self {
            player,
            position: 0.0,
        }
    }
}

impl MediaTransport for ExternalTransport {
    fn load(&mut self, path: &Path) {
        debug!("External player owns loading, ignoring {}", path.display());
        self.position = 0.0;
    }

    fn play(&mut self) {
        debug!("External player owns play state, ignoring play");
    }

    fn pause(&mut self) {
        debug!("External player owns play state, ignoring pause");
    }

    fn seek(&mut self, seconds: f64) {
        self.position = seconds;

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, cannot seek external player");
            return;
        };
        let player = Arc::clone(&self.player);
        runtime.spawn(async move {
            if let Err(e) = player.seek_to(seconds).await {
                warn!("External player seek failed: {}", e);
            }
        });
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        0.0
    }

    fn controls_playback(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ExternalPosition;
    use crate::error::Result;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct SeekRecorder {
        seeks: mpsc::UnboundedSender<f64>,
    }

    #[async_trait]
    impl PlayerQuery for SeekRecorder {
        async fn query_position(&self) -> Result<Option<ExternalPosition>> {
            Ok(None)
        }

        async fn seek_to(&self, position: f64) -> Result<()> {
            let _ = self.seeks.send(position);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_seek_forwards_to_player() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = ExternalTransport::new(Arc::new(SeekRecorder { seeks: tx }));

        transport.seek(42.0);
        assert!((transport.current_time() - 42.0).abs() < f64::EPSILON);

        let seeked = rx.recv().await.unwrap();
        assert!((seeked - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_seek_without_runtime_keeps_position() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut transport = ExternalTransport::new(Arc::new(SeekRecorder { seeks: tx }));

        transport.seek(7.0);
        transport.load(Path::new("/m/0.mp3"));
        assert!(transport.current_time().abs() < f64::EPSILON);
        assert!(!transport.controls_playback());
    }
}
