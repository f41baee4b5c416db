//! Media backends.
//!
//! The compositor only depends on [`MediaBackend`]: anything that can report
//! a video's frame size and draw an [`OverlayTrack`] onto it within each
//! instruction's window can stand in for FFmpeg.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use subburn_models::{EncodingConfig, JobId, LayoutSpec};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::filters::{build_filter_graph, VIDEO_OUT_LABEL};
use crate::overlay::OverlayTrack;
use crate::probe::{probe_video, VideoInfo};
use crate::progress::ProgressCallback;

/// Everything a backend needs to render one job.
///
/// All paths point into the job's workspace except `input`, which may be a
/// caller-owned file read in place.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub job_id: JobId,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Scratch file for the backend's intermediate cue track
    pub script: PathBuf,
    pub info: VideoInfo,
    pub track: OverlayTrack,
    pub layout: LayoutSpec,
    pub encoding: EncodingConfig,
}

#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Read frame size, duration and stream layout of a video.
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo>;

    /// Render `request.track` onto `request.input`, writing `request.output`.
    ///
    /// Audio is carried over unmodified. An existing output is replaced.
    async fn render(&self, request: &RenderRequest) -> MediaResult<()>;
}

/// FFmpeg/FFprobe backend: one `drawtext` filter per instruction, single pass.
#[derive(Clone, Default)]
pub struct FfmpegBackend {
    runner: FfmpegRunner,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill renders that run longer than `secs` seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.runner = self.runner.with_progress(callback);
        self
    }

    /// Build the FFmpeg invocation, writing the filter script if one is needed.
    pub async fn prepare(&self, request: &RenderRequest) -> MediaResult<FfmpegCommand> {
        let mut cmd = FfmpegCommand::new(&request.input, &request.output);

        match build_filter_graph(&request.track, &request.layout) {
            Some(graph) => {
                tokio::fs::write(&request.script, graph.as_bytes()).await?;
                debug!(
                    job_id = %request.job_id,
                    script = %request.script.display(),
                    instructions = request.track.len(),
                    "Wrote filter script"
                );
                cmd = cmd
                    .filter_complex_script(&request.script)
                    .map(format!("[{}]", VIDEO_OUT_LABEL));
            }
            None => {
                cmd = cmd.map("0:v:0");
            }
        }

        Ok(cmd
            .map("0:a?")
            .output_args(request.encoding.to_ffmpeg_args()))
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        probe_video(path).await
    }

    async fn render(&self, request: &RenderRequest) -> MediaResult<()> {
        let cmd = self.prepare(request).await?;

        info!(
            job_id = %request.job_id,
            instructions = request.track.len(),
            codec = %request.encoding.codec,
            "Rendering with FFmpeg"
        );

        self.runner.run(&cmd).await
    }
}
