//! Playback time helpers.
//!
//! Playback positions are plain `f64` seconds, as reported by media
//! transports. These helpers keep conversions explicit about truncation.

/// Format seconds as a clock string (`M:SS`), e.g. `185.2` -> `"3:05"`.
///
/// Negative and non-finite values are treated as zero.
#[must_use]
pub fn format_clock(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    format!("{}:{:02}", total / 60, total % 60)
}

/// Truncate seconds to a whole number, saturating at `u64::MAX`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn whole_seconds(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    if seconds >= u64::MAX as f64 {
        return u64::MAX;
    }
    seconds.floor() as u64
}

/// Clamp a seek target into `[0, duration]` (no upper bound when duration is unknown).
#[must_use]
pub fn clamp_position(position: f64, duration: f64) -> f64 {
    let position = if position.is_finite() { position.max(0.0) } else { 0.0 };
    if duration.is_finite() && duration > 0.0 {
        position.min(duration)
    } else {
        position
    }
}
