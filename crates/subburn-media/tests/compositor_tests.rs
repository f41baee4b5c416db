//! Compositor behavior against a scripted backend.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use subburn_media::{
    Compositor, CueSource, LayoutError, MediaBackend, MediaError, MediaResult, RenderJob,
    RenderRequest, VideoInfo, VideoSource,
};
use subburn_models::{CueList, JobId, LayoutSpec, Position, RawCue};

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Succeed,
    Fail,
    Hang,
    Panic,
    NoOutput,
}

struct FakeBackend {
    mode: Mode,
    height: u32,
    probes: AtomicUsize,
    requests: Mutex<Vec<RenderRequest>>,
    entered: Notify,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeBackend {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            height: 360,
            probes: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            entered: Notify::new(),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    fn last_request(&self) -> RenderRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if !path.exists() {
            return Err(MediaError::probe_failed("missing", None));
        }
        Ok(VideoInfo {
            duration: 10.0,
            width: 640,
            height: self.height,
            fps: 25.0,
            codec: "h264".to_string(),
            has_audio: true,
            audio_codec: Some("aac".to_string()),
            size: 0,
            bitrate: 0,
        })
    }

    async fn render(&self, request: &RenderRequest) -> MediaResult<()> {
        self.requests.lock().unwrap().push(request.clone());

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        // The cue track intermediate lives in the workspace too.
        tokio::fs::write(&request.script, b"track").await?;

        match self.mode {
            Mode::Succeed => {
                let body = format!("rendered {} overlays", request.track.len());
                tokio::fs::write(&request.output, body).await?;
                Ok(())
            }
            Mode::Fail => Err(MediaError::render_failed(
                "FFmpeg exited with non-zero status",
                Some("[Parsed_drawtext_0] Cannot load font\n".to_string()),
                Some(1),
            )),
            Mode::Hang => {
                self.entered.notify_one();
                std::future::pending::<()>().await;
                Ok(())
            }
            Mode::Panic => panic!("backend crashed"),
            Mode::NoOutput => Ok(()),
        }
    }
}

struct Harness {
    _root: tempfile::TempDir,
    work_dir: PathBuf,
    source: PathBuf,
}

impl Harness {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let work_dir = root.path().join("work");
        let source = root.path().join("source.mp4");
        std::fs::write(&source, b"not really a video").unwrap();
        Self {
            _root: root,
            work_dir,
            source,
        }
    }

    fn job(&self, cues: &[(f64, f64, &str)]) -> RenderJob {
        let raw: Vec<RawCue> = cues.iter().map(|&(s, e, t)| RawCue::new(s, e, t)).collect();
        RenderJob::new(VideoSource::path(&self.source), raw, LayoutSpec::default())
    }

    fn leftover_workspaces(&self) -> usize {
        match std::fs::read_dir(&self.work_dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

#[tokio::test]
async fn test_success_returns_output_and_cleans_up() {
    let h = Harness::new();
    let backend = Arc::new(FakeBackend::new(Mode::Succeed));
    let compositor = Compositor::from_arc(Arc::clone(&backend), &h.work_dir);

    let bytes = compositor
        .render(h.job(&[(0.0, 1.0, "one"), (2.0, 3.0, "two")]))
        .await
        .unwrap();

    assert_eq!(bytes, b"rendered 2 overlays");
    assert_eq!(h.leftover_workspaces(), 0);

    let request = backend.last_request();
    assert!(request.script.starts_with(&h.work_dir));
    assert!(!request.script.parent().unwrap().exists());
}

#[tokio::test]
async fn test_backend_failure_keeps_diagnostics_and_cleans_up() {
    let h = Harness::new();
    let compositor = Compositor::new(FakeBackend::new(Mode::Fail), &h.work_dir);

    let err = compositor
        .render(h.job(&[(0.0, 1.0, "one")]))
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::RenderFailed { exit_code: Some(1), .. }));
    assert_eq!(err.diagnostics(), Some("[Parsed_drawtext_0] Cannot load font\n"));
    assert_eq!(h.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_invalid_cue_fails_before_media_work() {
    let h = Harness::new();
    let backend = Arc::new(FakeBackend::new(Mode::Succeed));
    let compositor = Compositor::from_arc(Arc::clone(&backend), &h.work_dir);

    let err = compositor
        .render(h.job(&[(0.0, 1.0, "fine"), (5.0, 5.0, "zero length")]))
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::InvalidCue(_)));
    assert!(err.is_validation());
    assert_eq!(backend.probes.load(Ordering::SeqCst), 0);
    assert_eq!(h.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_font_taller_than_frame_is_layout_error() {
    let h = Harness::new();
    let backend = FakeBackend::new(Mode::Succeed).with_height(90);
    let compositor = Compositor::new(backend, &h.work_dir);

    let layout = LayoutSpec::new(96, "#FFFFFF", Position::Bottom).unwrap();
    let job = RenderJob::new(
        VideoSource::path(&h.source),
        vec![RawCue::new(0.0, 1.0, "big")],
        layout,
    );

    let err = compositor.render(job).await.unwrap_err();
    assert!(matches!(
        err,
        MediaError::Layout(LayoutError::FontTooLarge {
            font_size: 96,
            frame_height: 90
        })
    ));
    assert!(compositor.backend().requests.lock().unwrap().is_empty());
    assert_eq!(h.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_missing_source_is_probe_failure() {
    let h = Harness::new();
    let compositor = Compositor::new(FakeBackend::new(Mode::Succeed), &h.work_dir);
    let job = RenderJob::new(
        VideoSource::path(h.work_dir.join("nope.mp4")),
        CueList::empty(),
        LayoutSpec::default(),
    );

    let err = compositor.render(job).await.unwrap_err();
    assert!(matches!(err, MediaError::ProbeFailed { .. }));
    assert_eq!(h.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_dropped_job_cleans_up() {
    let h = Harness::new();
    let backend = Arc::new(FakeBackend::new(Mode::Hang));
    let compositor = Compositor::from_arc(Arc::clone(&backend), &h.work_dir);

    tokio::select! {
        _ = compositor.render(h.job(&[(0.0, 1.0, "stuck")])) => panic!("hung render finished"),
        _ = backend.entered.notified() => {}
    }

    assert_eq!(h.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_panicking_backend_cleans_up() {
    let h = Harness::new();
    let compositor = Compositor::new(FakeBackend::new(Mode::Panic), &h.work_dir);
    let job = h.job(&[(0.0, 1.0, "boom")]);

    let handle = tokio::spawn(async move { compositor.render(job).await });
    let err = handle.await.unwrap_err();

    assert!(err.is_panic());
    assert_eq!(h.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_missing_output_is_render_failure() {
    let h = Harness::new();
    let compositor = Compositor::new(FakeBackend::new(Mode::NoOutput), &h.work_dir);

    let err = compositor
        .render(h.job(&[(0.0, 1.0, "ghost")]))
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::RenderFailed { .. }));
    assert_eq!(h.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_overlapping_cues_reach_backend_intact() {
    let h = Harness::new();
    let backend = Arc::new(FakeBackend::new(Mode::Succeed));
    let compositor = Compositor::from_arc(Arc::clone(&backend), &h.work_dir);

    compositor
        .render(h.job(&[(2.0, 5.0, "B"), (0.0, 3.0, "A")]))
        .await
        .unwrap();

    let track = backend.last_request().track;
    let windows: Vec<_> = track
        .iter()
        .map(|i| (i.text.as_str(), i.start_ms, i.end_ms(), i.lane))
        .collect();
    assert_eq!(windows, [("A", 0, 3000, 0), ("B", 2000, 5000, 1)]);
}

#[tokio::test]
async fn test_zero_cues_still_renders() {
    let h = Harness::new();
    let backend = Arc::new(FakeBackend::new(Mode::Succeed));
    let compositor = Compositor::from_arc(Arc::clone(&backend), &h.work_dir);

    let bytes = compositor.render(h.job(&[])).await.unwrap();
    assert_eq!(bytes, b"rendered 0 overlays");
    assert!(backend.last_request().track.is_empty());
}

#[tokio::test]
async fn test_byte_source_is_staged_in_workspace() {
    let h = Harness::new();
    let backend = Arc::new(FakeBackend::new(Mode::Succeed));
    let compositor = Compositor::from_arc(Arc::clone(&backend), &h.work_dir);

    let job = RenderJob::new(
        VideoSource::bytes(b"video bytes".to_vec(), "mov"),
        CueSource::Srt("1\n00:00:00,000 --> 00:00:01,000\nhi\n".to_string()),
        LayoutSpec::default(),
    );
    compositor.render(job).await.unwrap();

    let input = backend.last_request().input;
    assert!(input.starts_with(&h.work_dir));
    assert!(input.ends_with("input.mov"));
    assert!(!input.exists());
    assert!(h.source.exists());
}

#[tokio::test]
async fn test_render_to_path_writes_destination() {
    let h = Harness::new();
    let compositor = Compositor::new(FakeBackend::new(Mode::Succeed), &h.work_dir);
    let dest = h.work_dir.with_file_name("out").join("final.mp4");

    let job = h
        .job(&[(0.0, 2.0, "A"), (1.0, 3.0, "B")])
        .with_id(JobId::from_string("fixed-id"));
    let summary = compositor.render_to_path(job, &dest).await.unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"rendered 2 overlays");
    assert_eq!(summary.job_id.as_str(), "fixed-id");
    assert_eq!(summary.cue_count, 2);
    assert_eq!(summary.lane_count, 2);
    assert_eq!((summary.width, summary.height), (640, 360));
    assert_eq!(summary.duration_ms, 10_000);
    assert_eq!(summary.output_bytes, 19);
    assert_eq!(h.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    let h = Harness::new();
    let backend = Arc::new(FakeBackend::new(Mode::Succeed));
    let compositor = Compositor::from_arc(Arc::clone(&backend), &h.work_dir).with_max_concurrent(1);

    let (a, b, c) = tokio::join!(
        compositor.render(h.job(&[(0.0, 1.0, "a")])),
        compositor.render(h.job(&[(0.0, 1.0, "b")])),
        compositor.render(h.job(&[(0.0, 1.0, "c")])),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(backend.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(h.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_unlimited_jobs_run_concurrently() {
    let h = Harness::new();
    let backend = Arc::new(FakeBackend::new(Mode::Succeed));
    let compositor = Compositor::from_arc(Arc::clone(&backend), &h.work_dir);

    let (a, b) = tokio::join!(
        compositor.render(h.job(&[(0.0, 1.0, "a")])),
        compositor.render(h.job(&[(0.0, 1.0, "b")])),
    );
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(backend.max_active.load(Ordering::SeqCst), 2);
}
