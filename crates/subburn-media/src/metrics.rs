//! Render metrics.
//!
//! Recorded through the `metrics` facade; installing an exporter is left to
//! the embedding application.

use metrics::{counter, gauge, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Finished jobs by outcome (`success` or an error kind).
    pub const JOBS_TOTAL: &str = "subburn_jobs_total";

    /// End-to-end job latency in seconds.
    pub const JOB_DURATION_SECONDS: &str = "subburn_job_duration_seconds";

    /// Cues per successful job.
    pub const CUES_PER_JOB: &str = "subburn_cues_per_job";

    /// Jobs currently holding a render slot.
    pub const ACTIVE_JOBS: &str = "subburn_active_jobs";

    /// Workspaces that could not be removed.
    pub const CLEANUP_FAILURES_TOTAL: &str = "subburn_cleanup_failures_total";
}

/// Record a finished job. `cue_count` is only known for successful jobs.
pub fn record_job(backend: &str, outcome: &str, elapsed_secs: f64, cue_count: Option<usize>) {
    counter!(
        names::JOBS_TOTAL,
        "backend" => backend.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        names::JOB_DURATION_SECONDS,
        "backend" => backend.to_string()
    )
    .record(elapsed_secs);

    if let Some(cues) = cue_count {
        histogram!(names::CUES_PER_JOB).record(cues as f64);
    }
}

pub fn job_started() {
    gauge!(names::ACTIVE_JOBS).increment(1.0);
}

pub fn job_finished() {
    gauge!(names::ACTIVE_JOBS).decrement(1.0);
}

pub fn record_cleanup_failure() {
    counter!(names::CLEANUP_FAILURES_TOTAL).increment(1);
}


#[cfg(test)]
mod tests {
    use super::testing::CapturingRecorder;
    use super::*;

    #[test]
    fn test_metric_names() {
        for name in [
            names::JOBS_TOTAL,
            names::JOB_DURATION_SECONDS,
            names::CUES_PER_JOB,
            names::ACTIVE_JOBS,
            names::CLEANUP_FAILURES_TOTAL,
        ] {
            assert!(name.starts_with("subburn_"));
        }
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_job("ffmpeg", "success", 1.5, Some(3));
        job_started();
        job_finished();
        record_cleanup_failure();
    }

    #[test]
    fn test_failed_jobs_skip_cue_histogram() {
        let recorder = CapturingRecorder::default();
        metrics::with_local_recorder(&recorder, || {
            record_job("ffmpeg", "success", 1.0, Some(4));
            record_job("ffmpeg", "render_failed", 0.5, None);
        });

        assert_eq!(recorder.counter(names::JOBS_TOTAL), 2);
        assert_eq!(recorder.histogram(names::JOB_DURATION_SECONDS).len(), 2);
        assert_eq!(recorder.histogram(names::CUES_PER_JOB), vec![4.0]);
    }
}
