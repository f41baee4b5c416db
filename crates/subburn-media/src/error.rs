//! Error types for media operations.

use subburn_models::{CueError, LayoutSpecError};
use thiserror::Error;

use crate::layout::LayoutError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while burning subtitles into a video.
///
/// `InvalidCue` and `Layout` are raised before any media work starts.
/// `ProbeFailed` and `RenderFailed` come from the backend and carry its
/// diagnostic output verbatim.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid cue: {0}")]
    InvalidCue(#[from] CueError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Probe failed: {message}")]
    ProbeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Render failed: {message}")]
    RenderFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<LayoutSpecError> for MediaError {
    fn from(err: LayoutSpecError) -> Self {
        Self::Layout(LayoutError::Spec(err))
    }
}

impl MediaError {
    /// Create a probe failure error.
    pub fn probe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProbeFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Create a render failure error.
    pub fn render_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::RenderFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a resource allocation error.
    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource(message.into())
    }

    /// Backend diagnostic text, when the failure came from the backend.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::ProbeFailed { stderr, .. } | Self::RenderFailed { stderr, .. } => {
                stderr.as_deref()
            }
            _ => None,
        }
    }

    /// Short stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCue(_) => "invalid_cue",
            Self::Layout(_) => "layout",
            Self::ProbeFailed { .. } | Self::FfprobeNotFound => "probe",
            Self::RenderFailed { .. } | Self::FfmpegNotFound => "render",
            Self::Resource(_) | Self::Io(_) => "resource",
            Self::Cancelled => "cancelled",
            Self::Timeout(_) => "timeout",
            Self::JsonParse(_) => "probe",
        }
    }

    /// Whether the input was rejected before any media processing.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidCue(_) | Self::Layout(_))
    }
}
