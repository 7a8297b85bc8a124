use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while scanning the music library.
#[derive(Debug, Error)]
pub enum TagsError {
    /// `library.music_dir` is not configured.
    #[error("No music directory configured (set library.music_dir)")]
    MusicDirNotSet,

    /// The configured music directory does not exist or is a file.
    #[error("Music directory is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The blocking scan task panicked or was cancelled.
    #[error("Library scan aborted: {reason}")]
    ScanAborted { reason: String },

    /// Catalog or metadata failure from the core crate.
    #[error(transparent)]
    Core(#[from] lyricsync_core::CoreError),
}

/// Convenience type alias for Results with `TagsError`.
pub type Result<T> = std::result::Result<T, TagsError>;
