use std::path::{Path, PathBuf};

/// Catalog-generated track identifier
pub type TrackId = i64;

/// Immutable identity of a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    pub path: PathBuf,
}

impl TrackInfo {
    /// Create a new track info with only a title and file path
    pub fn new(title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            artist: None,
            album: None,
            track_number: None,
            path: path.into(),
        }
    }

    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    #[must_use]
    pub const fn with_track_number(mut self, track_number: u32) -> Self {
        self.track_number = Some(track_number);
        self
    }

    /// Artist name, or an empty string when unknown
    #[must_use]
    pub fn artist_or_empty(&self) -> &str {
        self.artist.as_deref().unwrap_or_default()
    }
}

/// A catalog track: identity plus its optional persisted timetable
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub info: TrackInfo,
    /// Persisted timetable lines (`[<seconds>] <lyric>`), if one was recorded
    pub timetable: Option<Vec<String>>,
}

impl Track {
    #[must_use]
    pub const fn new(id: TrackId, info: TrackInfo) -> Self {
        Self {
            id,
            info,
            timetable: None,
        }
    }

    #[must_use]
    pub fn with_timetable(mut self, lines: Vec<String>) -> Self {
        self.timetable = Some(lines);
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.info.title
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.info.path
    }

    /// Whether a non-empty timetable is attached
    #[must_use]
    pub fn has_timetable(&self) -> bool {
        self.timetable.as_ref().is_some_and(|lines| !lines.is_empty())
    }
}

/// A named, ordered list of catalog tracks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub id: i64,
    pub name: String,
    pub track_ids: Vec<TrackId>,
}

/// Parse a tag track number such as `"3"` or `"3/12"`
#[must_use]
pub fn parse_track_number(raw: &str) -> Option<u32> {
    raw.split('/').next()?.trim().parse().ok()
}

/// Title derived from a file name when tags carry none (`"01 Song.mp3"` -> `"01 Song"`)
#[must_use]
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string()
}
