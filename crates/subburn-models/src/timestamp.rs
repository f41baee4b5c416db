//! Timestamp parsing and formatting utilities.
//!
//! Offsets are carried as whole milliseconds so that cue windows never
//! accumulate floating point drift. Supported input formats:
//! `HH:MM:SS,mmm` (SubRip), `HH:MM:SS.mmm`, `MM:SS[.mmm]` and `SS[.mmm]`.

use thiserror::Error;

/// Maximum reasonable offset (24 hours in milliseconds).
pub const MAX_OFFSET_MS: u64 = 86_400_000;

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Timestamp cannot be negative")]
    Negative,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid timestamp format '{0}'. Use HH:MM:SS,mmm, HH:MM:SS.mmm, MM:SS or SS")]
    InvalidFormat(String),

    #[error("Timestamp exceeds maximum allowed offset (24 hours)")]
    ExceedsMaximum,
}

/// Parse a timestamp string to milliseconds.
///
/// # Examples
/// ```
/// use subburn_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("00:01:02,500").unwrap(), 62_500);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330_000);
/// assert_eq!(parse_timestamp("1.25").unwrap(), 1_250);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<u64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }
    if ts.starts_with('-') {
        return Err(TimestampError::Negative);
    }

    // SubRip uses a comma before the milliseconds.
    let normalized = ts.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    let (hours, minutes, seconds) = match parts.as_slice() {
        [s] => (0, 0, *s),
        [m, s] => (0, parse_whole(m, "minutes")?, *s),
        [h, m, s] => (parse_whole(h, "hours")?, parse_whole(m, "minutes")?, *s),
        _ => return Err(TimestampError::InvalidFormat(ts.to_string())),
    };

    if parts.len() > 1 && minutes >= 60 {
        return Err(TimestampError::InvalidValue("minutes", minutes.to_string()));
    }

    let seconds_ms = parse_seconds_ms(seconds)?;
    if parts.len() > 1 && seconds_ms >= 60_000 {
        return Err(TimestampError::InvalidValue("seconds", seconds.to_string()));
    }

    let total = hours
        .checked_mul(3_600_000)
        .and_then(|h| h.checked_add(minutes * 60_000))
        .and_then(|hm| hm.checked_add(seconds_ms))
        .ok_or(TimestampError::ExceedsMaximum)?;

    if total > MAX_OFFSET_MS {
        return Err(TimestampError::ExceedsMaximum);
    }
    Ok(total)
}

fn parse_whole(value: &str, component: &'static str) -> Result<u64, TimestampError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimestampError::InvalidValue(component, value.to_string()));
    }
    value
        .parse()
        .map_err(|_| TimestampError::InvalidValue(component, value.to_string()))
}

/// Parse `SS` or `SS.fff` into milliseconds without going through floats.
fn parse_seconds_ms(value: &str) -> Result<u64, TimestampError> {
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    let secs = parse_whole(whole, "seconds")?;

    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimestampError::InvalidValue("seconds", value.to_string()));
    }
    // Keep millisecond precision, truncating anything finer.
    let mut millis = 0u64;
    for (i, digit) in frac.bytes().take(3).enumerate() {
        millis += u64::from(digit - b'0') * 10u64.pow(2 - i as u32);
    }

    secs.checked_mul(1000)
        .and_then(|s| s.checked_add(millis))
        .ok_or(TimestampError::ExceedsMaximum)
}

/// Format milliseconds as `HH:MM:SS.mmm`.
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let mins = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
}

/// Format milliseconds as decimal seconds (`12.345`), the form FFmpeg
/// expressions expect.
pub fn format_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}
