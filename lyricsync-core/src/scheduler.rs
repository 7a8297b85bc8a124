//! Cancellable repeating task.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const LOG_TARGET: &str = "lyricsync::scheduler";

/// Handle to a task that runs on a fixed interval until cancelled.
///
/// Ticks never overlap: the next tick waits for the previous one to finish,
/// and missed ticks are skipped rather than bunched up. Dropping the handle
/// cancels the task.
pub struct RepeatingTask {
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RepeatingTask {
    /// Spawn `tick` every `interval`, starting immediately.
    ///
    /// `parent` links the task to a wider shutdown token; cancelling it stops
    /// this task too.
    pub fn start<F, Fut>(interval: Duration, parent: Option<&CancellationToken>, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel_token = parent.map_or_else(CancellationToken::new, CancellationToken::child_token);
        let token = cancel_token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        debug!(target: LOG_TARGET, "Repeating task cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        tokio::select! {
                            () = token.cancelled() => break,
                            () = tick() => {}
                        }
                    }
                }
            }
        });

        Self {
            cancel_token,
            handle: Some(handle),
        }
    }

    /// Signal the task to stop after the current tick
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Stop the task and wait for it to finish
    pub async fn join(mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
