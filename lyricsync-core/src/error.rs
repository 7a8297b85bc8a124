use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - please edit it and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Missing required config field: {field}")]
    ConfigMissingField { field: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Timetable errors
    #[error("Malformed timetable line {line:?}: {reason}")]
    TimetableParse { line: String, reason: String },

    // Catalog errors
    #[error("Track not found: {id}")]
    TrackNotFound { id: i64 },

    #[error("Catalog database error: {0}")]
    CatalogError(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // Metadata errors
    #[error("Failed to read tags from {path}: {reason}")]
    MetadataRead { path: PathBuf, reason: String },

    // Player errors
    #[error("No lyric lines available to record against")]
    NoLyrics,

    #[error("A recording session is already active")]
    RecordingActive,

    #[error("Play queue is empty")]
    EmptyQueue,

    // Logging errors
    #[error("Failed to initialize logging: {reason}")]
    LoggingInit { reason: String },

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
