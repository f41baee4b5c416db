//! Timed subtitle cues.
//!
//! A [`Cue`] can only be constructed through validation, so any value of the
//! type satisfies `end > start` and carries non-empty text. A [`CueList`] is
//! the sorted, immutable collection consumed by the overlay builder.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timestamp::{format_timestamp, MAX_OFFSET_MS};

/// Errors raised while validating cue input.
///
/// `index` is the 0-based position in a cue list, or the 1-based block
/// number for SRT input, matching `MalformedSrt::block`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CueError {
    #[error("Invalid cue {index}: end ({end_ms}ms) must be after start ({start_ms}ms)")]
    NonPositiveDuration {
        index: usize,
        start_ms: u64,
        end_ms: u64,
    },

    #[error("Invalid cue {index}: text is empty")]
    EmptyText { index: usize },

    #[error("Invalid cue {index}: offset {value} is not a finite non-negative number")]
    InvalidOffset { index: usize, value: String },

    #[error("Invalid cue {index}: offset exceeds the 24 hour maximum")]
    OffsetTooLarge { index: usize },

    #[error("Malformed SRT block {block}: {reason}")]
    MalformedSrt { block: usize, reason: String },
}

impl CueError {
    /// Create a malformed SRT error.
    pub fn malformed_srt(block: usize, reason: impl Into<String>) -> Self {
        Self::MalformedSrt {
            block,
            reason: reason.into(),
        }
    }
}

/// Unvalidated cue as delivered by a caller or a transcription service.
///
/// Offsets are seconds from the start of the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl RawCue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// One validated subtitle utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Cue {
    start_ms: u64,
    end_ms: u64,
    text: String,
}

impl Cue {
    /// Create a cue from millisecond offsets.
    pub fn new(start_ms: u64, end_ms: u64, text: impl AsRef<str>) -> Result<Self, CueError> {
        Self::validated(0, start_ms, end_ms, text.as_ref())
    }

    /// Create a cue from fractional second offsets, rounded to milliseconds.
    pub fn from_secs(start: f64, end: f64, text: impl AsRef<str>) -> Result<Self, CueError> {
        Self::from_raw(0, &RawCue::new(start, end, text.as_ref()))
    }

    pub(crate) fn from_raw(index: usize, raw: &RawCue) -> Result<Self, CueError> {
        let start_ms = secs_to_ms(index, raw.start)?;
        let end_ms = secs_to_ms(index, raw.end)?;
        Self::validated(index, start_ms, end_ms, &raw.text)
    }

    pub(crate) fn validated(
        index: usize,
        start_ms: u64,
        end_ms: u64,
        text: &str,
    ) -> Result<Self, CueError> {
        if start_ms > MAX_OFFSET_MS || end_ms > MAX_OFFSET_MS {
            return Err(CueError::OffsetTooLarge { index });
        }
        // Zero and negative windows are rejected, never clamped.
        if end_ms <= start_ms {
            return Err(CueError::NonPositiveDuration {
                index,
                start_ms,
                end_ms,
            });
        }

        let text = normalize_text(text);
        if text.is_empty() {
            return Err(CueError::EmptyText { index });
        }

        Ok(Self {
            start_ms,
            end_ms,
            text,
        })
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> u64 {
        self.end_ms
    }

    /// Always greater than zero.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Rendered line count; embedded newlines are soft breaks.
    pub fn line_count(&self) -> u32 {
        self.text.lines().count().max(1) as u32
    }

    /// Whether the half-open windows `[start, end)` of both cues intersect.
    pub fn overlaps(&self, other: &Cue) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} --> {}] {}",
            format_timestamp(self.start_ms),
            format_timestamp(self.end_ms),
            self.text
        )
    }
}

fn secs_to_ms(index: usize, secs: f64) -> Result<u64, CueError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(CueError::InvalidOffset {
            index,
            value: secs.to_string(),
        });
    }
    let ms = (secs * 1000.0).round();
    if ms > MAX_OFFSET_MS as f64 {
        return Err(CueError::OffsetTooLarge { index });
    }
    Ok(ms as u64)
}

/// Trim surrounding whitespace and unify line endings. Inner newlines are
/// soft line breaks and are preserved.
fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Validated cues sorted by ascending start time.
///
/// Ties on start are ordered by end, then by input position, so the order is
/// fully deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RawCue>", into = "Vec<RawCue>")]
pub struct CueList {
    cues: Vec<Cue>,
}

impl CueList {
    /// Validate and sort raw cues. Fails on the first invalid cue.
    pub fn parse(raw: &[RawCue]) -> Result<Self, CueError> {
        let cues = raw
            .iter()
            .enumerate()
            .map(|(index, cue)| Cue::from_raw(index, cue))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_cues(cues))
    }

    /// Build a list from already-validated cues.
    pub fn from_cues(mut cues: Vec<Cue>) -> Self {
        // Stable sort keeps input order for identical windows.
        cues.sort_by_key(|c| (c.start_ms, c.end_ms));
        Self { cues }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    pub fn as_slice(&self) -> &[Cue] {
        &self.cues
    }

    /// End offset of the last cue to disappear.
    pub fn last_end_ms(&self) -> Option<u64> {
        self.cues.iter().map(Cue::end_ms).max()
    }

    /// Number of cues whose window intersects another cue's window.
    pub fn overlapping_count(&self) -> usize {
        self.cues
            .iter()
            .enumerate()
            .filter(|(i, cue)| {
                self.cues
                    .iter()
                    .enumerate()
                    .any(|(j, other)| *i != j && cue.overlaps(other))
            })
            .count()
    }
}

impl TryFrom<Vec<RawCue>> for CueList {
    type Error = CueError;

    fn try_from(raw: Vec<RawCue>) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<CueList> for Vec<RawCue> {
    fn from(list: CueList) -> Self {
        list.cues
            .into_iter()
            .map(|c| RawCue {
                start: c.start_ms as f64 / 1000.0,
                end: c.end_ms as f64 / 1000.0,
                text: c.text,
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a CueList {
    type Item = &'a Cue;
    type IntoIter = std::slice::Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}
