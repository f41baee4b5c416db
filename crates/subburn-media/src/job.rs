//! Render job description.

use std::path::{Path, PathBuf};

use subburn_models::{parse_srt, CueError, CueList, EncodingConfig, JobId, LayoutSpec, RawCue};

/// Where the source video comes from.
#[derive(Debug, Clone)]
pub enum VideoSource {
    /// In-memory video; staged into the job workspace before probing.
    Bytes { data: Vec<u8>, extension: String },
    /// A file on disk, read in place.
    Path(PathBuf),
}

impl VideoSource {
    pub fn bytes(data: Vec<u8>, extension: impl Into<String>) -> Self {
        Self::Bytes {
            data,
            extension: extension.into(),
        }
    }

    pub fn path(path: impl AsRef<Path>) -> Self {
        Self::Path(path.as_ref().to_path_buf())
    }
}

/// Subtitle input for a job.
#[derive(Debug, Clone)]
pub enum CueSource {
    /// Already validated cues
    Cues(CueList),
    /// Unvalidated `(start, end, text)` triples in seconds
    Raw(Vec<RawCue>),
    /// SubRip text
    Srt(String),
}

impl CueSource {
    /// Validate into a sorted cue list.
    pub fn into_cue_list(self) -> Result<CueList, CueError> {
        match self {
            Self::Cues(list) => Ok(list),
            Self::Raw(raw) => CueList::parse(&raw),
            Self::Srt(text) => parse_srt(&text),
        }
    }
}

impl From<CueList> for CueSource {
    fn from(list: CueList) -> Self {
        Self::Cues(list)
    }
}

impl From<Vec<RawCue>> for CueSource {
    fn from(raw: Vec<RawCue>) -> Self {
        Self::Raw(raw)
    }
}

/// One request to burn a cue list into a video.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub id: JobId,
    pub source: VideoSource,
    pub cues: CueSource,
    pub layout: LayoutSpec,
    pub encoding: EncodingConfig,
}

impl RenderJob {
    /// New job with a fresh ID and default encoding.
    pub fn new(source: VideoSource, cues: impl Into<CueSource>, layout: LayoutSpec) -> Self {
        Self {
            id: JobId::new(),
            source,
            cues: cues.into(),
            layout,
            encoding: EncodingConfig::default(),
        }
    }

    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = id;
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_sources_validate() {
        let raw = CueSource::Raw(vec![RawCue::new(2.0, 1.0, "backwards")]);
        assert!(matches!(
            raw.into_cue_list(),
            Err(CueError::NonPositiveDuration { index: 0, .. })
        ));

        let srt = CueSource::Srt("1\n00:00:00,500 --> 00:00:01,000\nhi\n".to_string());
        assert_eq!(srt.into_cue_list().unwrap().len(), 1);
    }

    #[test]
    fn test_job_builders() {
        let id = JobId::from_string("fixed");
        let job = RenderJob::new(
            VideoSource::path("/videos/in.mp4"),
            CueList::empty(),
            LayoutSpec::default(),
        )
        .with_id(id.clone())
        .with_encoding(EncodingConfig::default().with_codec("mpeg4"));

        assert_eq!(job.id, id);
        assert_eq!(job.encoding.codec, "mpeg4");
        assert!(matches!(job.source, VideoSource::Path(_)));
    }
}
