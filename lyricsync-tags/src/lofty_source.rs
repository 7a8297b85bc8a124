//! [`MetadataSource`] backed by the `lofty` tag reader.

use lofty::file::TaggedFileExt;
use lofty::tag::{Accessor, ItemKey, Tag};
use lyricsync_core::track::parse_track_number;
use lyricsync_core::{CoreError, MetadataSource, TrackTags};
use std::path::Path;
use tracing::debug;

/// Reads ID3, Vorbis, MP4 and other embedded tags via `lofty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyMetadata;

impl LoftyMetadata {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MetadataSource for LoftyMetadata {
    fn name(&self) -> &'static str {
        "lofty"
    }

    fn read_tags(&self, path: &Path) -> Result<TrackTags, CoreError> {
        let tagged = lofty::read_from_path(path).map_err(|e| CoreError::MetadataRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
            debug!("No tags in {}", path.display());
            return Ok(TrackTags::default());
        };

        Ok(tags_from(tag))
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Map a lofty tag onto the fields the player cares about
fn tags_from(tag: &Tag) -> TrackTags {
    let lyrics = tag
        .items()
        .find(|item| matches!(item.key(), ItemKey::Lyrics))
        .and_then(|item| item.value().text())
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string);

    // `track()` fails on "3/12" style values
    let track_number = tag.track().or_else(|| {
        tag.items()
            .find(|item| matches!(item.key(), ItemKey::TrackNumber))
            .and_then(|item| item.value().text())
            .and_then(parse_track_number)
    });

    TrackTags {
        title: tag.title().as_deref().and_then(non_empty),
        artist: tag.artist().as_deref().and_then(non_empty),
        album: tag.album().as_deref().and_then(non_empty),
        track_number,
        lyrics,
        artwork: tag.pictures().first().map(|picture| picture.data().to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::tag::TagType;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_tags_from_vorbis_comments() {
        let mut tag = Tag::new(TagType::VorbisComments);
        tag.set_title("Song".to_string());
        tag.set_artist("Artist".to_string());
        tag.set_album("  ".to_string());
        tag.insert_text(ItemKey::Lyrics, "first\nsecond".to_string());
        tag.insert_text(ItemKey::TrackNumber, "3/12".to_string());

        let tags = tags_from(&tag);

        assert_eq!(tags.title.as_deref(), Some("Song"));
        assert_eq!(tags.artist.as_deref(), Some("Artist"));
        assert_eq!(tags.album, None);
        assert_eq!(tags.track_number, Some(3));
        assert_eq!(tags.lyrics.as_deref(), Some("first\nsecond"));
        assert_eq!(tags.artwork, None);
    }

    #[test]
    fn test_empty_tag_yields_defaults() {
        let tag = Tag::new(TagType::VorbisComments);
        assert_eq!(tags_from(&tag), TrackTags::default());
    }

    #[test]
    fn test_unreadable_file_is_metadata_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.mp3");
        fs::write(&path, b"not real audio").unwrap();

        let err = LoftyMetadata::new().read_tags(&path).unwrap_err();
        assert!(matches!(err, CoreError::MetadataRead { path: p, .. } if p == path));
    }

    #[test]
    fn test_missing_file_is_metadata_error() {
        let err = LoftyMetadata::new()
            .read_tags(Path::new("/definitely/not/here.flac"))
            .unwrap_err();
        assert!(matches!(err, CoreError::MetadataRead { .. }));
    }
}
