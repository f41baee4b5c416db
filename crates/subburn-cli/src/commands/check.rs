//! Check FFmpeg availability.

use tokio::process::Command;

use subburn_media::{check_ffmpeg, check_ffprobe};

pub async fn run() -> anyhow::Result<()> {
    println!("subburn system check");
    println!("{}", "=".repeat(50));

    let mut ready = true;

    match check_ffprobe() {
        Ok(path) => println!("[OK] ffprobe: {}", path.display()),
        Err(e) => {
            ready = false;
            println!("[MISSING] ffprobe: {}", e);
        }
    }

    match check_ffmpeg() {
        Ok(path) => {
            println!("[OK] ffmpeg: {}", path.display());
            if has_drawtext(&path).await {
                println!("[OK] drawtext filter available");
            } else {
                ready = false;
                println!("[MISSING] drawtext filter (FFmpeg built without libfreetype?)");
            }
        }
        Err(e) => {
            ready = false;
            println!("[MISSING] ffmpeg: {}", e);
        }
    }

    println!();
    if ready {
        println!("Ready to burn subtitles.");
        Ok(())
    } else {
        anyhow::bail!("Some requirements are missing. See above.")
    }
}

async fn has_drawtext(ffmpeg: &std::path::Path) -> bool {
    match Command::new(ffmpeg)
        .args(["-hide_banner", "-filters"])
        .output()
        .await
    {
        Ok(output) => String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some("drawtext")),
        Err(_) => false,
    }
}
