use crate::error::{CoreError, Result};

/// Separator between the bracketed time and the lyric text
const SEPARATOR: &str = "] ";

/// A single (time, lyric line) pair of a timetable
#[derive(Debug, Clone, PartialEq)]
pub struct TimetableEntry {
    /// Reveal time in seconds
    pub time: f64,
    pub lyric_line: String,
}

impl TimetableEntry {
    pub fn new(time: f64, lyric_line: impl Into<String>) -> Self {
        Self {
            time,
            lyric_line: lyric_line.into(),
        }
    }
}

/// Ordered timetable for one track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timetable {
    pub entries: Vec<TimetableEntry>,
}

impl Timetable {
    /// Decode persisted timetable lines.
    ///
    /// Exactly-empty lines are skipped. Every other line must look like
    /// `[<seconds>] <lyric>`; only the first `"] "` splits time from text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TimetableParse`] for the first line lacking the
    /// bracketed time pattern.
    pub fn decode<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let entries = lines
            .iter()
            .map(AsRef::as_ref)
            .filter(|line| !line.is_empty())
            .map(parse_line)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Encode into persisted lines, one `[<seconds>] <lyric>` per entry.
    ///
    /// Seconds use the default `f64` formatting, so `1.0` is written as `1`.
    #[must_use]
    pub fn encode(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| format!("[{}{SEPARATOR}{}", entry.time, entry.lyric_line))
            .collect()
    }

    /// Zip timestamps with lyric lines. Extra items on either side are dropped.
    pub fn from_parts<S: AsRef<str>>(times: &[f64], lyric_lines: &[S]) -> Self {
        let entries = times
            .iter()
            .zip(lyric_lines)
            .map(|(&time, line)| TimetableEntry::new(time, line.as_ref()))
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.time).collect()
    }

    #[must_use]
    pub fn lyric_lines(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.lyric_line.clone()).collect()
    }

    /// Whether times never decrease in entry order
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        is_monotonic(&self.times())
    }
}

/// Whether a timestamp sequence never decreases
#[must_use]
pub fn is_monotonic(times: &[f64]) -> bool {
    times.windows(2).all(|pair| pair[0] <= pair[1])
}

/// Truncate a playback time to hundredths of a second
#[must_use]
pub fn centiseconds(time: f64) -> f64 {
    (time * 100.0).floor() / 100.0
}

/// Parse a line like `[12.34] Hello world`
fn parse_line(line: &str) -> Result<TimetableEntry> {
    let Some((head, lyric)) = line.split_once(SEPARATOR) else {
        return Err(parse_error(line, "missing `] ` separator"));
    };

    let token = head.strip_prefix('[').unwrap_or(head);
    if !is_time_token(token) {
        return Err(parse_error(line, "bracketed value is not a number of seconds"));
    }

    let time: f64 = token
        .parse()
        .map_err(|_| parse_error(line, "bracketed value is not a number of seconds"))?;

    Ok(TimetableEntry::new(time, lyric))
}

/// Digits, optionally followed by `.` and more digits
fn is_time_token(token: &str) -> bool {
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    match token.split_once('.') {
        Some((whole, frac)) => all_digits(whole) && all_digits(frac),
        None => all_digits(token),
    }
}

fn parse_error(line: &str, reason: &str) -> CoreError {
    CoreError::TimetableParse {
        line: line.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uses_default_float_formatting() {
        let timetable = Timetable::from_parts(&[1.0, 2.5, 4.0], &["a", "b", "c"]);
        assert_eq!(timetable.encode(), vec!["[1] a", "[2.5] b", "[4] c"]);
    }

    #[test]
    fn test_decode_simple_lines() {
        let timetable = Timetable::decode(&["[1] a", "[2.5] b", "[4] c"]).unwrap();
        assert_eq!(timetable.times(), vec![1.0, 2.5, 4.0]);
        assert_eq!(timetable.lyric_lines(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_decode_skips_empty_lines() {
        let timetable = Timetable::decode(&["", "[3.21] First", "", "[5] Second", ""]).unwrap();
        assert_eq!(timetable.len(), 2);
        assert_eq!(timetable.entries[0], TimetableEntry::new(3.21, "First"));
    }

    #[test]
    fn test_decode_without_leading_bracket() {
        let timetable = Timetable::decode(&["7.5] Lyric"]).unwrap();
        assert_eq!(timetable.entries[0], TimetableEntry::new(7.5, "Lyric"));
    }

    #[test]
    fn test_decode_keeps_text_after_first_separator() {
        let timetable = Timetable::decode(&["[1] see [this] here"]).unwrap();
        assert_eq!(timetable.entries[0].lyric_line, "see [this] here");
    }

    #[test]
    fn test_decode_empty_lyric() {
        let timetable = Timetable::decode(&["[12] "]).unwrap();
        assert_eq!(timetable.entries[0], TimetableEntry::new(12.0, ""));
    }

    #[test]
    fn test_decode_cjk_lyrics() {
        let timetable = Timetable::decode(&["[5] 你好世界"]).unwrap();
        assert_eq!(timetable.entries[0].lyric_line, "你好世界");
    }

    #[test]
    fn test_decode_rejects_missing_separator() {
        let err = Timetable::decode(&["[1]no space"]).unwrap_err();
        assert!(matches!(err, CoreError::TimetableParse { .. }));
    }

    #[test]
    fn test_decode_rejects_non_numeric_time() {
        assert!(Timetable::decode(&["[ti] Title"]).is_err());
        assert!(Timetable::decode(&["[1.] trailing dot"]).is_err());
        assert!(Timetable::decode(&["[.5] leading dot"]).is_err());
        assert!(Timetable::decode(&["[00:12.34] lrc style"]).is_err());
    }

    #[test]
    fn test_round_trip() {
        let original = Timetable {
            entries: vec![
                TimetableEntry::new(0.5, "Intro"),
                TimetableEntry::new(12.34, "Verse one"),
                TimetableEntry::new(12.34, ""),
                TimetableEntry::new(61.0, "Chorus [x2]"),
            ],
        };
        let decoded = Timetable::decode(&original.encode()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_from_parts_truncates_to_shorter() {
        let timetable = Timetable::from_parts(&[1.0, 2.0, 3.0], &["only", "two"]);
        assert_eq!(timetable.len(), 2);
    }

    #[test]
    fn test_centiseconds_floors() {
        assert!((centiseconds(1.239) - 1.23).abs() < f64::EPSILON);
        assert!((centiseconds(2.5) - 2.5).abs() < f64::EPSILON);
        assert!(centiseconds(0.004).abs() < f64::EPSILON);
    }

    #[test]
    fn test_is_monotonic() {
        assert!(is_monotonic(&[]));
        assert!(is_monotonic(&[1.0, 1.0, 2.0]));
        assert!(!is_monotonic(&[1.0, 0.5]));
        assert!(!Timetable::from_parts(&[3.0, 2.0], &["a", "b"]).is_monotonic());
    }
}
