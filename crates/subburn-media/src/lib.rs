//! Subtitle burn-in engine.
//!
//! This crate provides:
//! - Layout resolution from position keywords to pixel anchors
//! - Overlay track construction with literal-safe text escaping
//! - A pluggable media backend, with an FFmpeg/FFprobe implementation
//! - Scoped per-job temporary storage with guaranteed cleanup
//! - The compositor that drives one render job end to end

pub mod backend;
pub mod command;
pub mod compositor;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod job;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod overlay;
pub mod probe;
pub mod progress;
pub mod workspace;

pub use backend::{FfmpegBackend, MediaBackend, RenderRequest};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use compositor::{Compositor, RenderSummary};
pub use error::{MediaError, MediaResult};
pub use job::{CueSource, RenderJob, VideoSource};
pub use layout::{resolve, Anchor, LayoutError, ResolvedLayout, LINE_GAP, MARGIN};
pub use overlay::{build_track, OverlayInstruction, OverlayTrack};
pub use probe::{probe_video, VideoInfo};
pub use progress::{ProgressCallback, RenderProgress};
pub use workspace::JobWorkspace;
