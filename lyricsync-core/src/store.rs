use crate::error::CoreError;
use crate::track::{Playlist, Track, TrackId, TrackInfo};
use async_trait::async_trait;

/// Query over catalog tracks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrackQuery {
    /// Every track
    #[default]
    All,
    /// Exact id match
    Id(TrackId),
    /// Set membership over ids
    Ids(Vec<TrackId>),
    /// Exact title and artist match (empty artist matches tracks without one)
    TitleArtist { title: String, artist: String },
    /// Every keyword must appear in the title, artist or album
    Keywords(Vec<String>),
}

impl TrackQuery {
    /// Exact title + artist query for a track identity
    #[must_use]
    pub fn identity(info: &TrackInfo) -> Self {
        Self::TitleArtist {
            title: info.title.clone(),
            artist: info.artist_or_empty().to_string(),
        }
    }

    /// Keyword search, splitting on ASCII and ideographic spaces
    #[must_use]
    pub fn search(input: &str) -> Self {
        let words = input
            .split([' ', '\u{3000}'])
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self::Keywords(words)
    }
}

/// Repository of catalog tracks.
///
/// Implementations are document-store-like; the player depends only on this
/// contract, not on the engine behind it.
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// First track matching the query
    async fn find_one(&self, query: &TrackQuery) -> Result<Option<Track>, CoreError>;

    /// All tracks matching the query
    async fn find(&self, query: &TrackQuery) -> Result<Vec<Track>, CoreError>;

    /// Insert or update a track by (title, artist), keeping any stored timetable
    async fn upsert(&self, info: &TrackInfo) -> Result<TrackId, CoreError>;

    /// Replace the persisted timetable of a track
    async fn set_timetable(&self, id: TrackId, lines: &[String]) -> Result<(), CoreError>;

    /// Number of tracks matching the query
    async fn count(&self, query: &TrackQuery) -> Result<usize, CoreError>;

    /// Delete matching tracks, returning how many were removed
    async fn remove(&self, query: &TrackQuery) -> Result<usize, CoreError>;
}

/// Repository of named playlists
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    /// Create or replace a playlist
    async fn save_playlist(&self, name: &str, track_ids: &[TrackId]) -> Result<i64, CoreError>;

    /// Playlist by name
    async fn playlist(&self, name: &str) -> Result<Option<Playlist>, CoreError>;

    /// Playlists containing at least one of `track_ids`
    async fn playlists_containing(&self, track_ids: &[TrackId])
        -> Result<Vec<Playlist>, CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_splits_on_both_spaces() {
        assert_eq!(
            TrackQuery::search("love\u{3000}song  live"),
            TrackQuery::Keywords(vec!["love".into(), "song".into(), "live".into()])
        );
    }

    #[test]
    fn test_search_empty_input() {
        assert_eq!(TrackQuery::search("   "), TrackQuery::Keywords(vec![]));
    }

    #[test]
    fn test_identity_query() {
        let info = TrackInfo::new("Song", "/m/a.mp3");
        assert_eq!(
            TrackQuery::identity(&info),
            TrackQuery::TitleArtist {
                title: "Song".into(),
                artist: String::new()
            }
        );
    }
}
