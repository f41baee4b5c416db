//! Load and inspect cue files.

use std::path::{Path, PathBuf};

use anyhow::Context;

use subburn_media::CueSource;
use subburn_models::{format_timestamp, CueList};

/// Read a cue file. `.json` holds an array of `{start, end, text}` in
/// seconds; anything else is read as SubRip.
pub fn load(path: &Path) -> anyhow::Result<CueSource> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cue file {}", path.display()))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let list: CueList = serde_json::from_str(&text)
            .with_context(|| format!("Invalid cue JSON in {}", path.display()))?;
        Ok(CueSource::Cues(list))
    } else {
        Ok(CueSource::Srt(text))
    }
}

pub fn run(path: PathBuf, json: bool) -> anyhow::Result<()> {
    let list = load(&path)?
        .into_cue_list()
        .with_context(|| format!("Invalid cues in {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("{} cues in {}", list.len(), path.display());
    for (i, cue) in list.iter().enumerate() {
        println!(
            "{:>4}  {} --> {}  {}",
            i + 1,
            format_timestamp(cue.start_ms()),
            format_timestamp(cue.end_ms()),
            cue.text().replace('\n', " / ")
        );
    }

    let overlapping = list.overlapping_count();
    if overlapping > 0 {
        println!("{} cues overlap another cue", overlapping);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_json_and_srt() {
        let dir = tempfile::tempdir().unwrap();

        let json = dir.path().join("cues.JSON");
        std::fs::write(&json, r#"[{"start": 0.0, "end": 1.5, "text": "hi"}]"#).unwrap();
        assert!(matches!(load(&json).unwrap(), CueSource::Cues(l) if l.len() == 1));

        let srt = dir.path().join("cues.srt");
        std::fs::write(&srt, "1\n00:00:00,000 --> 00:00:01,000\nhi\n").unwrap();
        assert!(matches!(load(&srt).unwrap(), CueSource::Srt(_)));
    }

    #[test]
    fn test_invalid_json_cue_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("bad.json");
        std::fs::write(&json, r#"[{"start": 2.0, "end": 1.0, "text": "x"}]"#).unwrap();
        assert!(load(&json).is_err());
    }
}
