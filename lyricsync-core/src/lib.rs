pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod paths;
pub mod playback;
pub mod player;
pub mod playlist;
pub mod recording;
pub mod resolver;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod time;
pub mod timetable;
pub mod track;
pub mod tracker;
pub mod transport;

pub use catalog::SqliteCatalog;
pub use config::{
    build_config_template, DatabaseConfig, DisplayConfig, FontColor, LibraryConfig,
    LoggingConfig, LyricsyncConfig, PlaybackConfig, SourcesConfig,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use engine::{PlayerEngine, PlayerEvent};
pub use error::{CoreError, Result};
pub use logging::init_tracing;
pub use metadata::{split_lyric_lines, MetadataSource, TrackTags};
pub use paths::{
    catalog_db_path, config_dir, config_path, log_file_path, CATALOG_DB_FILE_NAME,
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME,
};
pub use playback::{PlaybackState, PlayerStatus};
pub use player::{CommitRequest, PlayerController, PlayerKey, PlayerState};
pub use playlist::{LoopMode, PlayQueue};
pub use recording::{RecordingAction, RecordingSession, RecordingState};
pub use resolver::{LyricDisplayState, LyricResolver, LyricSource};
pub use scheduler::RepeatingTask;
pub use source::{PositionSource, SourceKind, TransportEventSource};
pub use store::{PlaylistRepository, TrackQuery, TrackRepository};
pub use time::format_clock;
pub use timetable::{Timetable, TimetableEntry};
pub use track::{Playlist, Track, TrackId, TrackInfo};
pub use tracker::{Highlight, HighlightMode, PositionTracker};
pub use transport::{MediaTransport, NullTransport, TransportEvent};
