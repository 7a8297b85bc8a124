//! Position sources: where playback position updates come from.

use crate::engine::PlayerEngine;
use crate::error::Result;
use crate::transport::TransportEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const LOG_TARGET: &str = "lyricsync::source";

/// How a position source produces updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Notifications pushed by the local media transport
    Transport,
    /// Fixed-interval queries against an external player
    ExternalPlayer,
}

impl SourceKind {
    /// Stable identifier, also used as the `[sources.<name>]` config key
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::ExternalPlayer => "external_player",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pluggable source of playback position updates.
///
/// Implementations feed the [`PlayerEngine`] until cancelled. Updates for a
/// track must be tagged with (or derived under) that track's epoch so the
/// engine can drop samples that arrive after a track change.
#[async_trait]
pub trait PositionSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Returns a human-readable name for this source.
    fn name(&self) -> &'static str;

    /// Run until cancelled or an unrecoverable error occurs.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot start or fails fatally.
    async fn run(&self) -> Result<()>;

    fn cancel_token(&self) -> CancellationToken;

    /// Signal the source to stop.
    fn stop(&self) {
        self.cancel_token().cancel();
    }
}

/// Event-driven source: forwards media transport notifications to the engine.
///
/// The transport side holds the [`mpsc::Sender`] returned by [`Self::new`].
pub struct TransportEventSource {
    engine: Arc<PlayerEngine>,
    events: Mutex<mpsc::Receiver<TransportEvent>>,
    cancel_token: CancellationToken,
}

impl TransportEventSource {
    /// Create the source and the sender the transport should notify through
    pub fn new(
        engine: Arc<PlayerEngine>,
        buffer: usize,
    ) -> (Self, mpsc::Sender<TransportEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let source = Self {
            engine,
            events: Mutex::new(rx),
            cancel_token: CancellationToken::new(),
        };
        (source, tx)
    }
}

#[async_trait]
impl PositionSource for TransportEventSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Transport
    }

    fn name(&self) -> &'static str {
        "Media transport"
    }

    async fn run(&self) -> Result<()> {
        info!(target: LOG_TARGET, "Forwarding media transport events");
        let mut events = self.events.lock().await;

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: LOG_TARGET, "Transport event source shutting down");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        debug!(target: LOG_TARGET, "Transport event channel closed");
                        break;
                    };
                    self.engine.on_transport_event(event).await;
                }
            }
        }
        Ok(())
    }

    fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}
