//! Metadata collaborator: tag reading for audio files.

use crate::error::Result;
use std::path::Path;

/// Tags read from an audio file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    /// Unsynchronised lyrics text
    pub lyrics: Option<String>,
    /// Embedded cover art bytes
    pub artwork: Option<Vec<u8>>,
}

/// Source of embedded track metadata.
///
/// Reads are synchronous and expected to be fast; callers on an interactive
/// path should move slow sources off the interaction thread.
pub trait MetadataSource: Send + Sync {
    /// Returns a human-readable name for this source.
    fn name(&self) -> &'static str;

    /// Read tags from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its tags cannot be parsed.
    fn read_tags(&self, path: &Path) -> Result<TrackTags>;
}

/// Split raw lyrics text into lines on `\r\n`, `\n` or `\r`.
///
/// Empty input yields no lines; otherwise blank lines (including a trailing
/// one after a final line break) are kept so every line can be aligned.
#[must_use]
pub fn split_lyric_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' => lines.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    lines.push(current);

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_mixed_line_endings() {
        assert_eq!(
            split_lyric_lines("one\r\ntwo\nthree\rfour"),
            vec!["one", "two", "three", "four"]
        );
    }

    #[test]
    fn test_split_keeps_blank_lines() {
        assert_eq!(split_lyric_lines("a\n\nb\n"), vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_split_empty_text() {
        assert!(split_lyric_lines("").is_empty());
    }

    #[test]
    fn test_split_cr_cr_lf() {
        assert_eq!(split_lyric_lines("a\r\r\nb"), vec!["a", "", "b"]);
    }
}
