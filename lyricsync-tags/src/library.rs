//! Music library walking and catalog rescan.

use crate::error::{Result, TagsError};
use lyricsync_core::track::title_from_path;
use lyricsync_core::{LibraryConfig, MetadataSource, TrackInfo, TrackRepository, TrackTags};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const LOG_TARGET: &str = "lyricsync::library";

/// Summary of one rescan pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescanReport {
    /// Audio files found under the music directory
    pub files: usize,
    /// Tracks inserted or updated in the catalog
    pub upserted: usize,
    /// Files whose tags could not be read (catalogued by file name)
    pub unreadable: usize,
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// List audio files under `dir`, sorted by path.
///
/// Unreadable directory entries are logged and skipped.
#[must_use]
pub fn scan_files(dir: &Path, config: &LibraryConfig) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(dir);

    // Depth 0 is the root itself, so 1 lists only its direct children.
    let depth_cap = if config.recursive {
        config.max_depth
    } else {
        Some(1)
    };
    if let Some(depth) = depth_cap {
        walker = walker.max_depth(depth);
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|e| config.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(target: LOG_TARGET, "Skipping library entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && config.is_audio_file(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();

    files.sort();
    files
}

/// Build the catalog identity for a file from its tags
fn track_info(path: &Path, tags: TrackTags) -> TrackInfo {
    TrackInfo {
        title: tags.title.unwrap_or_else(|| title_from_path(path)),
        artist: tags.artist,
        album: tags.album,
        track_number: tags.track_number,
        path: path.to_path_buf(),
    }
}

/// Read tags for every file, falling back to the file name for the title
fn collect(files: &[PathBuf], metadata: &dyn MetadataSource) -> (Vec<TrackInfo>, usize) {
    let mut unreadable = 0;
    let infos = files
        .iter()
        .map(|path| {
            let tags = metadata.read_tags(path).unwrap_or_else(|e| {
                debug!(target: LOG_TARGET, "{}", e);
                unreadable += 1;
                TrackTags::default()
            });
            track_info(path, tags)
        })
        .collect();
    (infos, unreadable)
}

/// Walk the configured music directory and upsert every audio file into the catalog.
///
/// Existing timetables are preserved; the upsert only refreshes track identity.
///
/// # Errors
///
/// Returns an error if no music directory is configured, it is not a
/// directory, or a catalog write fails.
pub async fn rescan(
    config: &LibraryConfig,
    metadata: Arc<dyn MetadataSource>,
    tracks: &dyn TrackRepository,
) -> Result<RescanReport> {
    let dir = config.music_dir.clone().ok_or(TagsError::MusicDirNotSet)?;
    if !dir.is_dir() {
        return Err(TagsError::NotADirectory { path: dir });
    }

    info!(target: LOG_TARGET, "Rescanning {} with {}", dir.display(), metadata.name());

    // Directory walking and tag parsing are blocking file I/O
    let config = config.clone();
    let (infos, files, unreadable) = tokio::task::spawn_blocking(move || {
        let files = scan_files(&dir, &config);
        let (infos, unreadable) = collect(&files, metadata.as_ref());
        (infos, files.len(), unreadable)
    })
    .await
    .map_err(|e| TagsError::ScanAborted {
        reason: e.to_string(),
    })?;

    let mut upserted = 0;
    for info in &infos {
        tracks.upsert(info).await?;
        upserted += 1;
    }

    if unreadable > 0 {
        warn!(target: LOG_TARGET, "{} of {} files had unreadable tags", unreadable, files);
    }
    info!(target: LOG_TARGET, "Rescan complete: {} tracks catalogued", upserted);

    Ok(RescanReport {
        files,
        upserted,
        unreadable,
    })
}
