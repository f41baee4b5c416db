//! Shared data models for subtitle burn-in.
//!
//! This crate provides Serde-serializable types for:
//! - Timed subtitle cues and validated, sorted cue lists
//! - SRT text parsing into cues
//! - Overlay layout configuration (font, color, position)
//! - Encoding configuration
//! - Job identifiers

pub mod cue;
pub mod encoding;
pub mod job;
pub mod layout;
pub mod srt;
pub mod timestamp;

// Re-export common types
pub use cue::{Cue, CueError, CueList, RawCue};
pub use encoding::EncodingConfig;
pub use job::JobId;
pub use layout::{FontColor, LayoutSpec, LayoutSpecError, Position, StackingMode};
pub use srt::parse_srt;
pub use timestamp::{format_timestamp, parse_timestamp, TimestampError};
