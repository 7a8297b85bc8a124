//! Media transport collaborator: the opaque audio player.

use std::path::Path;

/// Opaque media transport exposing play/pause/seek and position.
///
/// Decoding and output are the transport's business; the player only
/// drives it and listens to its [`TransportEvent`]s.
pub trait MediaTransport: Send {
    /// Load the file at `path`, replacing the current source.
    fn load(&mut self, path: &Path);

    fn play(&mut self);

    fn pause(&mut self);

    /// Move the playback position to `seconds`.
    fn seek(&mut self, seconds: f64);

    /// Current position in seconds.
    fn current_time(&self) -> f64;

    /// Length of the loaded source in seconds (0 while unknown).
    fn duration(&self) -> f64;

    /// Whether `play`/`pause` actually start and stop playback.
    ///
    /// False when another application owns the audio output; the player then
    /// leaves its status to that application's reports.
    fn controls_playback(&self) -> bool {
        true
    }
}

/// Notifications fired by a media transport
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportEvent {
    /// Source loaded and its duration is known
    Loaded { duration: f64 },
    /// Playback position changed
    Position { time: f64 },
    Played,
    Paused,
    /// Playback reached the end of the source
    Ended,
}

/// Transport that does nothing but remember what it was asked to do.
///
/// Used when position updates come from an external player that owns the
/// audio output.
#[derive(Debug, Clone, Default)]
pub struct NullTransport {
    position: f64,
    duration: f64,
}

impl NullTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MediaTransport for NullTransport {
    fn load(&mut self, _path: &Path) {
        self.position = 0.0;
        self.duration = 0.0;
    }

    fn play(&mut self) {}

    fn pause(&mut self) {}

    fn seek(&mut self, seconds: f64) {
        self.position = seconds;
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn controls_playback(&self) -> bool {
        false
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::MediaTransport;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    /// Calls observed by [`RecordingTransport`]
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Load(PathBuf),
        Play,
        Pause,
        Seek(f64),
    }

    /// Transport that logs every call into a shared vector
    #[derive(Clone, Default)]
    pub struct RecordingTransport {
        pub calls: Arc<Mutex<Vec<Call>>>,
        pub position: Arc<Mutex<f64>>,
    }

    impl RecordingTransport {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn clear(&self) {
            self.calls.lock().unwrap().clear();
        }
    }

    impl MediaTransport for RecordingTransport {
        fn load(&mut self, path: &Path) {
            self.calls.lock().unwrap().push(Call::Load(path.to_path_buf()));
            *self.position.lock().unwrap() = 0.0;
        }

        fn play(&mut self) {
            self.calls.lock().unwrap().push(Call::Play);
        }

        fn pause(&mut self) {
            self.calls.lock().unwrap().push(Call::Pause);
        }

        fn seek(&mut self, seconds: f64) {
            self.calls.lock().unwrap().push(Call::Seek(seconds));
            *self.position.lock().unwrap() = seconds;
        }

        fn current_time(&self) -> f64 {
            *self.position.lock().unwrap()
        }

        fn duration(&self) -> f64 {
            180.0
        }
    }
}
