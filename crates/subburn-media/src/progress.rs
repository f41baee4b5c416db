//! Render progress reported from FFmpeg's `-progress` stream.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Progress snapshot for a running render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderProgress {
    /// Frames written so far
    pub frame: u64,
    /// Current encoding FPS
    pub fps: f64,
    /// Output position in milliseconds
    pub out_time_ms: u64,
    /// Encoding speed relative to realtime (1.5 = 1.5x)
    pub speed: f64,
    /// Set once FFmpeg reports `progress=end`
    pub is_complete: bool,
}

impl RenderProgress {
    /// Completed fraction in `[0.0, 1.0]` for a video of `total_ms`.
    pub fn fraction(&self, total_ms: u64) -> f64 {
        if total_ms == 0 {
            return if self.is_complete { 1.0 } else { 0.0 };
        }
        (self.out_time_ms as f64 / total_ms as f64).min(1.0)
    }

    /// Estimated seconds remaining, once speed is known.
    pub fn eta_seconds(&self, total_ms: u64) -> Option<f64> {
        if self.speed <= 0.0 || self.out_time_ms == 0 {
            return None;
        }
        let remaining_ms = total_ms.saturating_sub(self.out_time_ms);
        Some((remaining_ms as f64 / 1000.0) / self.speed)
    }

    /// Fold one `key=value` line into the snapshot.
    ///
    /// Returns a copy whenever a block ends (`progress=...`).
    pub(crate) fn apply_line(&mut self, line: &str) -> Option<RenderProgress> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            // Both keys carry microseconds despite the name.
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<u64>() {
                    self.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.frame = frame;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    self.fps = fps;
                }
            }
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse::<f64>().ok()) {
                    self.speed = speed;
                }
            }
            "progress" => {
                self.is_complete = value == "end";
                return Some(self.clone());
            }
            _ => {}
        }
        None
    }
}

/// Whether a stderr line belongs to the `-progress` stream rather than
/// FFmpeg's diagnostics.
pub(crate) fn is_progress_line(line: &str) -> bool {
    const KEYS: &[&str] = &[
        "frame", "fps", "stream_0_0_q", "bitrate", "total_size", "out_time_us", "out_time_ms",
        "out_time", "dup_frames", "drop_frames", "speed", "progress",
    ];
    line.split_once('=')
        .map(|(key, _)| KEYS.contains(&key.trim()))
        .unwrap_or(false)
}

/// Callback for progress updates. Shared so one backend can serve many jobs.
pub type ProgressCallback = Arc<dyn Fn(RenderProgress) + Send + Sync + 'static>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_and_eta() {
        let progress = RenderProgress {
            out_time_ms: 5000,
            speed: 2.0,
            ..Default::default()
        };
        assert!((progress.fraction(10_000) - 0.5).abs() < 1e-9);
        assert!((progress.fraction(4_000) - 1.0).abs() < 1e-9);
        // 5 seconds left at 2x
        assert!((progress.eta_seconds(10_000).unwrap() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_apply_lines() {
        let mut progress = RenderProgress::default();
        assert!(progress.apply_line("out_time_us=5000000").is_none());
        assert_eq!(progress.out_time_ms, 5000);
        progress.apply_line("speed=1.5x");
        assert!((progress.speed - 1.5).abs() < 0.01);
        progress.apply_line("speed=N/A");
        assert!((progress.speed - 1.5).abs() < 0.01);

        let snapshot = progress.apply_line("progress=end").unwrap();
        assert!(snapshot.is_complete);
    }

    #[test]
    fn test_progress_lines_are_told_apart_from_diagnostics() {
        assert!(is_progress_line("out_time=00:00:01.000000"));
        assert!(is_progress_line("progress=continue"));
        assert!(!is_progress_line("[Parsed_drawtext_0 @ 0x1] Cannot find a valid font"));
        assert!(!is_progress_line("Error initializing filter 'drawtext' with args 'text=a=b'"));
    }
}
