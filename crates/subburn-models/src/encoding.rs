//! Video encoding configuration.
//!
//! Only the video stream is re-encoded; audio is always stream-copied so the
//! original track survives untouched.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// Default output container extension
pub const DEFAULT_CONTAINER: &str = "mp4";

/// Video encoding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264", "libx265", "mpeg4")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium"); empty to omit
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (0-51, lower is better); `None` to omit
    #[serde(default = "default_crf")]
    pub crf: Option<u8>,

    /// Output container extension
    #[serde(default = "default_container")]
    pub container: String,

    /// Move the MP4 index to the front for progressive playback
    #[serde(default = "default_faststart")]
    pub faststart: bool,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> Option<u8> {
    Some(DEFAULT_CRF)
}
fn default_container() -> String {
    DEFAULT_CONTAINER.to_string()
}
fn default_faststart() -> bool {
    true
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: Some(DEFAULT_CRF),
            container: DEFAULT_CONTAINER.to_string(),
            faststart: true,
            extra_args: Vec::new(),
        }
    }
}

impl EncodingConfig {
    /// Create a new encoding configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different video codec.
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: Option<u8>) -> Self {
        self.crf = crf.map(|c| c.min(51));
        self
    }

    /// Whether the container understands `+faststart`.
    fn is_mp4_family(&self) -> bool {
        matches!(self.container.as_str(), "mp4" | "mov" | "m4v")
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec!["-c:v".to_string(), self.codec.clone()];

        if !self.preset.is_empty() {
            args.extend(["-preset".to_string(), self.preset.clone()]);
        }
        if let Some(crf) = self.crf {
            args.extend(["-crf".to_string(), crf.to_string()]);
        }

        // Audio is never re-encoded.
        args.extend(["-c:a".to_string(), "copy".to_string()]);

        if self.faststart && self.is_mp4_family() {
            args.extend(["-movflags".to_string(), "+faststart".to_string()]);
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EncodingConfig::default();
        assert_eq!(config.codec, "libx264");
        assert_eq!(config.crf, Some(18));
        assert_eq!(config.container, "mp4");
    }

    #[test]
    fn test_ffmpeg_args_copy_audio() {
        let args = EncodingConfig::default().to_ffmpeg_args();
        let pos = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[pos + 1], "copy");
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
    }

    #[test]
    fn test_ffmpeg_args_omit_optional() {
        let config = EncodingConfig::default()
            .with_codec("mpeg4")
            .with_preset("")
            .with_crf(None);
        let args = config.to_ffmpeg_args();
        assert!(!args.contains(&"-preset".to_string()));
        assert!(!args.contains(&"-crf".to_string()));
    }

    #[test]
    fn test_crf_is_capped() {
        let config = EncodingConfig::default().with_crf(Some(80));
        assert_eq!(config.crf, Some(51));
    }

    #[test]
    fn test_faststart_only_for_mp4() {
        let config = EncodingConfig {
            container: "mkv".to_string(),
            ..Default::default()
        };
        assert!(!config.to_ffmpeg_args().contains(&"-movflags".to_string()));
    }
}
