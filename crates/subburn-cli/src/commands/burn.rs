//! Burn subtitles into a video.

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use subburn_media::{
    probe_video, Compositor, FfmpegBackend, ProgressCallback, RenderJob, RenderProgress,
    VideoSource,
};
use subburn_models::{JobId, LayoutSpec};

use crate::config::RenderConfig;
use crate::BurnArgs;

pub async fn run(args: BurnArgs, mut config: RenderConfig) -> anyhow::Result<()> {
    apply_overrides(&args, &mut config);
    info!("Render config: {:?}", config);

    let layout = layout_from_args(&args)?;
    let cues = super::cues::load(&args.cues)?;

    let mut job = RenderJob::new(VideoSource::path(&args.input), cues, layout)
        .with_encoding(config.encoding());
    if let Some(id) = &args.job_id {
        job = job.with_id(JobId::from_string(id.clone()));
    }

    // Sizes the progress report only; a probe failure surfaces from the render.
    let total_ms = match probe_video(&args.input).await {
        Ok(info) => info.duration_ms(),
        Err(e) => {
            debug!("Duration unknown before render: {}", e);
            0
        }
    };

    let mut backend = FfmpegBackend::new().with_progress(progress_reporter(total_ms));
    if let Some(secs) = config.timeout_secs {
        backend = backend.with_timeout(secs);
    }

    let compositor = Compositor::new(backend, &config.work_dir)
        .with_max_concurrent(config.max_ffmpeg_processes);

    let summary = tokio::select! {
        result = compositor.render_to_path(job, &args.output) => result
            .with_context(|| format!("Failed to burn subtitles into {}", args.input.display()))?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, abandoning render");
            anyhow::bail!("Interrupted");
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Wrote {} ({} bytes, {} cues, {}x{}) in {:.1}s",
            args.output.display(),
            summary.output_bytes,
            summary.cue_count,
            summary.width,
            summary.height,
            summary.elapsed_ms as f64 / 1000.0
        );
    }
    Ok(())
}

fn progress_reporter(total_ms: u64) -> ProgressCallback {
    Arc::new(move |p: RenderProgress| {
        info!(
            frame = p.frame,
            out_time_ms = p.out_time_ms,
            "Render progress: {}",
            describe_progress(&p, total_ms)
        );
    })
}

fn describe_progress(progress: &RenderProgress, total_ms: u64) -> String {
    let percent = progress.fraction(total_ms) * 100.0;
    match progress.eta_seconds(total_ms) {
        Some(eta) if total_ms > 0 && !progress.is_complete => {
            format!("{:.1}% at {:.2}x, about {:.0}s left", percent, progress.speed, eta)
        }
        _ => format!("{:.1}%", percent),
    }
}

fn apply_overrides(args: &BurnArgs, config: &mut RenderConfig) {
    if let Some(codec) = &args.codec {
        config.codec = codec.clone();
    }
    if let Some(preset) = &args.preset {
        config.preset = preset.clone();
    }
    if args.crf.is_some() {
        config.crf = args.crf;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = (timeout > 0).then_some(timeout);
    }
    if let Some(dir) = &args.work_dir {
        config.work_dir = dir.clone();
    }
}

fn layout_from_args(args: &BurnArgs) -> anyhow::Result<LayoutSpec> {
    let mut layout = LayoutSpec::new(args.font_size, &args.color, args.position)?;

    layout = if args.no_stroke {
        layout.without_stroke()
    } else {
        layout.with_stroke(&args.stroke_color, args.stroke_width)?
    };

    if let Some(font_file) = &args.font_file {
        anyhow::ensure!(
            font_file.is_file(),
            "Font file not found: {}",
            font_file.display()
        );
        layout = layout.with_font_file(font_file);
    }

    Ok(layout.with_stacking(args.stacking))
}
