//! Render configuration from the environment.

use std::path::PathBuf;

use subburn_models::encoding::{DEFAULT_CRF, DEFAULT_PRESET, DEFAULT_VIDEO_CODEC};
use subburn_models::EncodingConfig;

/// Defaults for every render started by this process.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Root for per-job workspaces
    pub work_dir: PathBuf,
    /// Render timeout in seconds; `None` waits forever
    pub timeout_secs: Option<u64>,
    /// Concurrent FFmpeg processes; 0 is unlimited
    pub max_ffmpeg_processes: usize,
    pub codec: String,
    pub preset: String,
    pub crf: Option<u8>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("subburn"),
            timeout_secs: Some(3600), // 1 hour
            max_ffmpeg_processes: 4,
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: Some(DEFAULT_CRF),
        }
    }
}

impl RenderConfig {
    /// Read `SUBBURN_*` variables, falling back to defaults for anything
    /// unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            work_dir: lookup("SUBBURN_WORK_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            timeout_secs: match lookup("SUBBURN_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
                Some(0) => None,
                Some(secs) => Some(secs),
                None => defaults.timeout_secs,
            },
            max_ffmpeg_processes: lookup("SUBBURN_MAX_FFMPEG")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_ffmpeg_processes),
            codec: lookup("SUBBURN_CODEC").unwrap_or(defaults.codec),
            preset: lookup("SUBBURN_PRESET").unwrap_or(defaults.preset),
            crf: match lookup("SUBBURN_CRF").as_deref().map(str::trim) {
                Some("") | Some("none") => None,
                Some(s) => s.parse().ok().or(defaults.crf),
                None => defaults.crf,
            },
        }
    }

    pub fn encoding(&self) -> EncodingConfig {
        EncodingConfig::default()
            .with_codec(self.codec.clone())
            .with_preset(self.preset.clone())
            .with_crf(self.crf)
    }
}
