//! Show video properties.

use std::path::PathBuf;

use anyhow::Context;

use subburn_media::probe_video;
use subburn_models::format_timestamp;

pub async fn run(input: PathBuf, json: bool) -> anyhow::Result<()> {
    let info = probe_video(&input)
        .await
        .with_context(|| format!("Failed to probe {}", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File:      {}", input.display());
    println!("Size:      {}x{}", info.width, info.height);
    println!("Duration:  {}", format_timestamp(info.duration_ms()));
    println!("FPS:       {:.2}", info.fps);
    println!("Video:     {}", info.codec);
    match &info.audio_codec {
        Some(codec) => println!("Audio:     {}", codec),
        None if info.has_audio => println!("Audio:     unknown codec"),
        None => println!("Audio:     none"),
    }
    Ok(())
}
