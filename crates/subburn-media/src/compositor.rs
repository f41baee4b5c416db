//! Render job driver.
//!
//! A job runs validate -> stage -> probe -> layout -> track -> render ->
//! deliver. Cue and layout validation happen before any file is touched;
//! everything after that lives in a [`JobWorkspace`] that is removed when
//! the job ends, however it ends.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::Instrument;

use subburn_models::JobId;

use crate::backend::{FfmpegBackend, MediaBackend, RenderRequest};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::move_file;
use crate::job::{RenderJob, VideoSource};
use crate::layout::ResolvedLayout;
use crate::logging::JobLogger;
use crate::metrics;
use crate::overlay::build_track;
use crate::workspace::JobWorkspace;

/// What a finished job produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSummary {
    pub job_id: JobId,
    pub backend: String,
    pub cue_count: usize,
    /// Stacking lanes in use
    pub lane_count: u32,
    pub width: u32,
    pub height: u32,
    pub duration_ms: u64,
    pub output_bytes: u64,
    pub elapsed_ms: u64,
}

enum Delivery {
    Bytes,
    File(PathBuf),
}

/// Runs render jobs against a [`MediaBackend`].
///
/// Cheap to clone; clones share the backend and the concurrency limit.
pub struct Compositor<B: MediaBackend = FfmpegBackend> {
    backend: Arc<B>,
    work_dir: PathBuf,
    limiter: Option<Arc<Semaphore>>,
}

impl<B: MediaBackend> Clone for Compositor<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            work_dir: self.work_dir.clone(),
            limiter: self.limiter.clone(),
        }
    }
}

impl Compositor<FfmpegBackend> {
    /// Compositor over a default FFmpeg backend.
    pub fn ffmpeg(work_dir: impl AsRef<Path>) -> Self {
        Self::new(FfmpegBackend::new(), work_dir)
    }
}

impl<B: MediaBackend> Compositor<B> {
    /// `work_dir` is where per-job workspaces are created.
    pub fn new(backend: B, work_dir: impl AsRef<Path>) -> Self {
        Self::from_arc(Arc::new(backend), work_dir)
    }

    pub fn from_arc(backend: Arc<B>, work_dir: impl AsRef<Path>) -> Self {
        Self {
            backend,
            work_dir: work_dir.as_ref().to_path_buf(),
            limiter: None,
        }
    }

    /// Allow at most `max` renders at once. `0` removes the limit.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.limiter = (max > 0).then(|| Arc::new(Semaphore::new(max)));
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Render a job and return the output video bytes.
    pub async fn render(&self, job: RenderJob) -> MediaResult<Vec<u8>> {
        let (_, bytes) = self.run(job, Delivery::Bytes).await?;
        Ok(bytes.unwrap_or_default())
    }

    /// Render a job straight to `dest`, replacing any existing file.
    pub async fn render_to_path(
        &self,
        job: RenderJob,
        dest: impl AsRef<Path>,
    ) -> MediaResult<RenderSummary> {
        let (summary, _) = self
            .run(job, Delivery::File(dest.as_ref().to_path_buf()))
            .await?;
        Ok(summary)
    }

    async fn run(
        &self,
        job: RenderJob,
        delivery: Delivery,
    ) -> MediaResult<(RenderSummary, Option<Vec<u8>>)> {
        let started = Instant::now();
        let logger = JobLogger::new(&job.id, "burn_in");
        let span = logger.create_span();

        let result = self
            .execute(job, delivery, &logger, started)
            .instrument(span)
            .await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok((summary, _)) => {
                metrics::record_job(
                    self.backend.name(),
                    "success",
                    elapsed,
                    Some(summary.cue_count),
                );
                logger.log_completion(&format!(
                    "{} cues, {} bytes in {:.2}s",
                    summary.cue_count, summary.output_bytes, elapsed
                ));
            }
            Err(e) => {
                metrics::record_job(self.backend.name(), e.kind(), elapsed, None);
                logger.log_error(e.kind(), &e.to_string());
            }
        }

        result
    }

    async fn execute(
        &self,
        job: RenderJob,
        delivery: Delivery,
        logger: &JobLogger,
        started: Instant,
    ) -> MediaResult<(RenderSummary, Option<Vec<u8>>)> {
        let RenderJob {
            id,
            source,
            cues,
            layout,
            encoding,
        } = job;

        let cues = cues.into_cue_list()?;
        layout.validate()?;
        logger.log_start(&format!("{} cues, position {}", cues.len(), layout.position));

        let _permit = match &self.limiter {
            Some(limiter) => Some(
                Arc::clone(limiter)
                    .acquire_owned()
                    .await
                    .map_err(|_| MediaError::resource("Render limiter closed"))?,
            ),
            None => None,
        };
        let _active = ActiveJob::start();

        let workspace = JobWorkspace::create(&self.work_dir, &id)?;
        let input = stage_source(source, &workspace).await?;

        logger.log_stage("probe", &format!("Probing {}", input.display()));
        let info = self.backend.probe(&input).await?;

        let resolved = ResolvedLayout::new(&layout, info.width, info.height)?;
        let track = build_track(&cues, &resolved)?;

        let duration_ms = info.duration_ms();
        if duration_ms > 0 {
            let late = cues.iter().filter(|c| c.start_ms() >= duration_ms).count();
            if late > 0 {
                logger.log_warning(&format!(
                    "{} cues start after the video ends ({} ms) and will not appear",
                    late, duration_ms
                ));
            }
        }

        let request = RenderRequest {
            job_id: id.clone(),
            input,
            output: workspace.output_path(&encoding.container),
            script: workspace.script_path(),
            info,
            track,
            layout,
            encoding,
        };

        logger.log_stage(
            "render",
            &format!(
                "{} overlays at {}x{}",
                request.track.len(),
                request.info.width,
                request.info.height
            ),
        );
        self.backend.render(&request).await?;

        let output_bytes = output_size(&request.output).await?;

        let bytes = match delivery {
            Delivery::Bytes => Some(tokio::fs::read(&request.output).await?),
            Delivery::File(dest) => {
                move_file(&request.output, &dest).await?;
                None
            }
        };

        let summary = RenderSummary {
            job_id: id,
            backend: self.backend.name().to_string(),
            cue_count: cues.len(),
            lane_count: request.track.lane_count(),
            width: request.info.width,
            height: request.info.height,
            duration_ms,
            output_bytes,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        drop(workspace);
        Ok((summary, bytes))
    }
}

/// Put the source where the backend can read it.
async fn stage_source(source: VideoSource, workspace: &JobWorkspace) -> MediaResult<PathBuf> {
    match source {
        VideoSource::Path(path) => Ok(path),
        VideoSource::Bytes { data, extension } => {
            let path = workspace.input_path(&extension);
            tokio::fs::write(&path, &data).await.map_err(|e| {
                MediaError::resource(format!("Cannot stage source video: {}", e))
            })?;
            Ok(path)
        }
    }
}

async fn output_size(path: &Path) -> MediaResult<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(meta.len()),
        _ => Err(MediaError::render_failed(
            format!("Backend produced no output at {}", path.display()),
            None,
            None,
        )),
    }
}

/// Counts a job in the active-jobs gauge while it holds a render slot,
/// including when the job future is dropped.
struct ActiveJob;

impl ActiveJob {
    fn start() -> Self {
        metrics::job_started();
        Self
    }
}

impl Drop for ActiveJob {
    fn drop(&mut self) {
        metrics::job_finished();
    }
}
