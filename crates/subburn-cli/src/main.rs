//! subburn: burn timed subtitles into a video.
//!
//! Usage:
//!   subburn burn <INPUT> --cues <FILE> -o <OUTPUT>   Render subtitles into a video
//!   subburn probe <INPUT>                            Show video properties
//!   subburn cues <FILE>                              Validate a cue file
//!   subburn check                                    Check FFmpeg availability
//!   subburn schema                                   Print JSON schemas for job settings

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use subburn_models::layout::{DEFAULT_FONT_COLOR, DEFAULT_STROKE_COLOR};
use subburn_models::{Position, StackingMode};

mod commands;
mod config;

#[derive(Parser)]
#[command(
    name = "subburn",
    about = "Burn timed subtitles into videos",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render subtitles into a video
    Burn(BurnArgs),

    /// Show video properties
    Probe {
        /// Video file
        input: PathBuf,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a cue file (.srt or .json) and list its cues
    Cues {
        /// Cue file
        path: PathBuf,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that FFmpeg and FFprobe are usable
    Check,

    /// Print JSON schemas for layout and encoding settings
    Schema,
}

#[derive(Args)]
pub struct BurnArgs {
    /// Source video
    pub input: PathBuf,

    /// Cue file: SubRip text, or a JSON array of {start, end, text}
    #[arg(short, long)]
    pub cues: PathBuf,

    /// Output video
    #[arg(short, long)]
    pub output: PathBuf,

    /// Font size in pixels (8-96)
    #[arg(long, default_value = "24")]
    pub font_size: u32,

    /// Text color: #RRGGBB, #RGB, #RRGGBBAA or a color name
    #[arg(long, default_value = DEFAULT_FONT_COLOR)]
    pub color: String,

    /// Vertical placement: top|center|bottom
    #[arg(long, default_value = "bottom")]
    pub position: Position,

    /// Outline color
    #[arg(long, default_value = DEFAULT_STROKE_COLOR)]
    pub stroke_color: String,

    /// Outline width in pixels
    #[arg(long, default_value = "1")]
    pub stroke_width: u32,

    /// Draw text without an outline
    #[arg(long)]
    pub no_stroke: bool,

    /// TrueType font file
    #[arg(long)]
    pub font_file: Option<PathBuf>,

    /// Simultaneous cues: stack|overlap
    #[arg(long, default_value = "stack")]
    pub stacking: StackingMode,

    /// Video codec (overrides SUBBURN_CODEC)
    #[arg(long)]
    pub codec: Option<String>,

    /// Encoder preset (overrides SUBBURN_PRESET)
    #[arg(long)]
    pub preset: Option<String>,

    /// Constant rate factor (overrides SUBBURN_CRF)
    #[arg(long)]
    pub crf: Option<u8>,

    /// Render timeout in seconds, 0 for none (overrides SUBBURN_TIMEOUT_SECS)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Workspace root (overrides SUBBURN_WORK_DIR)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Job ID used in logs and workspace names
    #[arg(long)]
    pub job_id: Option<String>,

    /// Print the render summary as JSON
    #[arg(long)]
    pub json: bool,
}

fn init_logging(verbose: bool) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,subburn={lvl},subburn_media={lvl},subburn_models={lvl}",
            lvl = default_level
        ))
    });

    // stdout carries command output; logs go to stderr
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::RenderConfig::from_env();

    match cli.command {
        Commands::Burn(args) => commands::burn::run(args, config).await,
        Commands::Probe { input, json } => commands::probe::run(input, json).await,
        Commands::Cues { path, json } => commands::cues::run(path, json),
        Commands::Check => commands::check::run().await,
        Commands::Schema => commands::schema::run(),
    }
}
