use crate::error::{CoreError, Result};
use crate::store::{PlaylistRepository, TrackQuery, TrackRepository};
use crate::track::{Playlist, Track, TrackId, TrackInfo};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::OptionalExtension;
use std::path::{Path, PathBuf};
use tokio_rusqlite::Connection;
use tracing::{debug, info};

const SCHEMA_SQL: &str = r"
-- Library tracks; identity is (title, artist), artist '' when unknown
CREATE TABLE IF NOT EXISTS tracks (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    artist TEXT NOT NULL DEFAULT '',
    album TEXT,
    track_number INTEGER,
    path TEXT NOT NULL,
    timetable TEXT,
    updated_at INTEGER NOT NULL,
    UNIQUE(title, artist)
);

CREATE TABLE IF NOT EXISTS playlists (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS playlist_tracks (
    playlist_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    track_id INTEGER NOT NULL,
    PRIMARY KEY (playlist_id, position),
    FOREIGN KEY (playlist_id) REFERENCES playlists(id) ON DELETE CASCADE,
    FOREIGN KEY (track_id) REFERENCES tracks(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_tracks_path ON tracks(path);
CREATE INDEX IF NOT EXISTS idx_playlist_tracks_track ON playlist_tracks(track_id);
";

const TRACK_COLUMNS: &str = "id, title, artist, album, track_number, path, timetable";
const TRACK_ORDER: &str = "ORDER BY artist, album, track_number, title, id";

/// SQLite-backed track and playlist catalog
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Open the catalog at the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog database cannot be created or opened.
    pub async fn new() -> Result<Self> {
        Self::open(&crate::paths::catalog_db_path()).await
    }

    /// Open a catalog at a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open(path: &Path) -> Result<Self> {
        info!("Opening catalog database at {:?}", path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).await?;
        conn.call(|conn| {
            conn.execute_batch(SCHEMA_SQL)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        })
        .await?;

        info!("Catalog database initialized");
        Ok(Self { conn })
    }

    /// Open a throwaway in-memory catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        conn.call(|conn| {
            conn.execute_batch(SCHEMA_SQL)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }

    /// Checkpoint WAL for clean shutdown
    ///
    /// # Errors
    ///
    /// Returns an error if the WAL checkpoint fails.
    pub async fn checkpoint(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")?;
                Ok(())
            })
            .await
            .map_err(Into::into)
    }
}

/// Translate a query into a WHERE clause and its positional parameters.
///
/// Empty id sets and empty keyword lists match nothing.
fn where_clause(query: &TrackQuery) -> (String, Vec<Value>) {
    match query {
        TrackQuery::All => ("1".to_string(), Vec::new()),
        TrackQuery::Id(id) => ("id = ?".to_string(), vec![Value::Integer(*id)]),
        TrackQuery::Ids(ids) if ids.is_empty() => ("0".to_string(), Vec::new()),
        TrackQuery::Ids(ids) => {
            let marks = vec!["?"; ids.len()].join(", ");
            (
                format!("id IN ({marks})"),
                ids.iter().map(|&id| Value::Integer(id)).collect(),
            )
        }
        TrackQuery::TitleArtist { title, artist } => (
            "title = ? AND artist = ?".to_string(),
            vec![Value::Text(title.clone()), Value::Text(artist.clone())],
        ),
        TrackQuery::Keywords(words) if words.is_empty() => ("0".to_string(), Vec::new()),
        TrackQuery::Keywords(words) => {
            let clause = vec![
                "(instr(title, ?) > 0 OR instr(artist, ?) > 0 OR instr(COALESCE(album, ''), ?) > 0)";
                words.len()
            ]
            .join(" AND ");
            let params = words
                .iter()
                .flat_map(|w| std::iter::repeat(Value::Text(w.clone())).take(3))
                .collect();
            (clause, params)
        }
    }
}

fn track_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Track> {
    let artist: String = row.get(2)?;
    let path: String = row.get(5)?;
    let timetable = row
        .get::<_, Option<String>>(6)?
        .map(|json| serde_json::from_str::<Vec<String>>(&json))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Track {
        id: row.get(0)?,
        info: TrackInfo {
            title: row.get(1)?,
            artist: (!artist.is_empty()).then_some(artist),
            album: row.get(3)?,
            track_number: row.get(4)?,
            path: PathBuf::from(path),
        },
        timetable,
    })
}

fn to_usize(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

fn load_playlist_tracks(
    conn: &rusqlite::Connection,
    playlist_id: i64,
) -> rusqlite::Result<Vec<TrackId>> {
    let mut stmt = conn.prepare_cached(
        "SELECT track_id FROM playlist_tracks WHERE playlist_id = ?1 ORDER BY position",
    )?;
    let ids = stmt
        .query_map(rusqlite::params![playlist_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<TrackId>>>()?;
    Ok(ids)
}

fn playlist_heads(
    conn: &rusqlite::Connection,
    sql: &str,
    params: Vec<Value>,
) -> rusqlite::Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare(sql)?;
    let heads = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(heads)
}

#[async_trait]
impl TrackRepository for SqliteCatalog {
    async fn find_one(&self, query: &TrackQuery) -> Result<Option<Track>> {
        let (clause, params) = where_clause(query);
        let sql = format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE {clause} {TRACK_ORDER} LIMIT 1");

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let track = stmt
                    .query_row(rusqlite::params_from_iter(params), track_from_row)
                    .optional()?;
                Ok(track)
            })
            .await
            .map_err(Into::into)
    }

    async fn find(&self, query: &TrackQuery) -> Result<Vec<Track>> {
        let (clause, params) = where_clause(query);
        let sql = format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE {clause} {TRACK_ORDER}");

        let tracks = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let tracks = stmt
                    .query_map(rusqlite::params_from_iter(params), track_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(tracks)
            })
            .await?;

        debug!("Catalog query {:?} matched {} tracks", query, tracks.len());
        Ok(tracks)
    }

    async fn upsert(&self, info: &TrackInfo) -> Result<TrackId> {
        let title = info.title.clone();
        let artist = info.artist_or_empty().to_string();
        let album = info.album.clone();
        let track_number = info.track_number.map(i64::from);
        let path = info.path.to_string_lossy().into_owned();
        let now = Utc::now().timestamp();

        self.conn
            .call(move |conn| {
                // The timetable column is left alone so rescans never drop a recording
                let id = conn.query_row(
                    r"
                    INSERT INTO tracks (title, artist, album, track_number, path, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(title, artist) DO UPDATE SET
                        album = excluded.album,
                        track_number = excluded.track_number,
                        path = excluded.path,
                        updated_at = excluded.updated_at
                    RETURNING id
                ",
                    rusqlite::params![title, artist, album, track_number, path, now],
                    |row| row.get(0),
                )?;
                Ok(id)
            })
            .await
            .map_err(Into::into)
    }

    async fn set_timetable(&self, id: TrackId, lines: &[String]) -> Result<()> {
        info!("Storing timetable for track {} ({} lines)", id, lines.len());
        let json = serde_json::to_string(lines)?;
        let now = Utc::now().timestamp();

        let updated = self
            .conn
            .call(move |conn| {
                let updated = conn.execute(
                    "UPDATE tracks SET timetable = ?1, updated_at = ?2 WHERE id = ?3",
                    rusqlite::params![json, now, id],
                )?;
                Ok(updated)
            })
            .await?;

        if updated == 0 {
            return Err(CoreError::TrackNotFound { id });
        }
        Ok(())
    }

    async fn count(&self, query: &TrackQuery) -> Result<usize> {
        let (clause, params) = where_clause(query);
        let sql = format!("SELECT COUNT(*) FROM tracks WHERE {clause}");

        let count: i64 = self
            .conn
            .call(move |conn| {
                let count = conn.query_row(&sql, rusqlite::params_from_iter(params), |row| {
                    row.get(0)
                })?;
                Ok(count)
            })
            .await?;
        Ok(to_usize(count))
    }

    async fn remove(&self, query: &TrackQuery) -> Result<usize> {
        let (clause, params) = where_clause(query);
        let sql = format!("DELETE FROM tracks WHERE {clause}");

        let removed = self
            .conn
            .call(move |conn| {
                let removed = conn.execute(&sql, rusqlite::params_from_iter(params))?;
                Ok(removed)
            })
            .await?;

        info!("Removed {} tracks from catalog", removed);
        Ok(removed)
    }
}

#[async_trait]
impl PlaylistRepository for SqliteCatalog {
    async fn save_playlist(&self, name: &str, track_ids: &[TrackId]) -> Result<i64> {
        info!("Saving playlist {:?} ({} tracks)", name, track_ids.len());
        let name = name.to_string();
        let track_ids = track_ids.to_vec();
        let now = Utc::now().timestamp();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let playlist_id: i64 = tx.query_row(
                    r"
                    INSERT INTO playlists (name, updated_at) VALUES (?1, ?2)
                    ON CONFLICT(name) DO UPDATE SET updated_at = excluded.updated_at
                    RETURNING id
                ",
                    rusqlite::params![name, now],
                    |row| row.get(0),
                )?;

                tx.execute(
                    "DELETE FROM playlist_tracks WHERE playlist_id = ?1",
                    rusqlite::params![playlist_id],
                )?;
                {
                    let mut stmt = tx.prepare_cached(
                        "INSERT INTO playlist_tracks (playlist_id, position, track_id) VALUES (?1, ?2, ?3)",
                    )?;
                    for (position, track_id) in (0_i64..).zip(&track_ids) {
                        stmt.execute(rusqlite::params![playlist_id, position, track_id])?;
                    }
                }
                tx.commit()?;
                Ok(playlist_id)
            })
            .await
            .map_err(Into::into)
    }

    async fn playlist(&self, name: &str) -> Result<Option<Playlist>> {
        let name = name.to_string();

        self.conn
            .call(move |conn| {
                let id: Option<i64> = conn
                    .query_row(
                        "SELECT id FROM playlists WHERE name = ?1",
                        rusqlite::params![name],
                        |row| row.get(0),
                    )
                    .optional()?;

                let Some(id) = id else {
                    return Ok(None);
                };
                let track_ids = load_playlist_tracks(conn, id)?;
                Ok(Some(Playlist {
                    id,
                    name,
                    track_ids,
                }))
            })
            .await
            .map_err(Into::into)
    }

    async fn playlists_containing(&self, track_ids: &[TrackId]) -> Result<Vec<Playlist>> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }
        let marks = vec!["?"; track_ids.len()].join(", ");
        let sql = format!(
            r"
            SELECT DISTINCT p.id, p.name
            FROM playlists p
            INNER JOIN playlist_tracks pt ON p.id = pt.playlist_id
            WHERE pt.track_id IN ({marks})
            ORDER BY p.name
        "
        );
        let params: Vec<Value> = track_ids.iter().map(|&id| Value::Integer(id)).collect();

        self.conn
            .call(move |conn| {
                let heads = playlist_heads(conn, &sql, params)?;
                let mut playlists = Vec::with_capacity(heads.len());
                for (id, name) in heads {
                    playlists.push(Playlist {
                        id,
                        name,
                        track_ids: load_playlist_tracks(conn, id)?,
                    });
                }
                Ok(playlists)
            })
            .await
            .map_err(Into::into)
    }
}
