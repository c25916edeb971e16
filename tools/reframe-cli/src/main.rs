//! Reframe CLI: reframe one image or video into several aspect ratios.
//!
//! Usage:
//!   reframe check                      Check that the video engine starts
//!   reframe targets                    List configured target frames
//!   reframe probe <FILE>               Show media kind and dimensions
//!   reframe plan <FILE>                Print composition plans
//!   reframe replay <EVENTS> ...        Drive the gesture controller from a recording
//!   reframe export <FILE>              Export every target frame

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reframe_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reframe",
    about = "Reframe images and videos for square, landscape, and portrait outputs",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/reframe/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that ffmpeg is usable as the video engine
    Check,

    /// List the configured target frames
    Targets,

    /// Show media kind, dimensions, and duration
    Probe {
        /// Image or video file
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the composition plan for each target
    Plan {
        /// Image or video file
        file: PathBuf,

        /// Layout file with per-target transforms
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Only these targets (repeatable)
        #[arg(short, long = "target")]
        targets: Vec<String>,

        /// Background colour (#RRGGBB, 0xRRGGBB, or a name)
        #[arg(long)]
        background: Option<String>,
    },

    /// Replay recorded pointer events against one target
    Replay {
        /// JSONL pointer events
        events: PathBuf,

        /// Media the events were recorded against
        #[arg(long)]
        media: PathBuf,

        /// Target frame label
        #[arg(short, long)]
        target: String,

        /// Preview container size, e.g. 1000x1000
        #[arg(long, value_parser = commands::parse_size)]
        container: (f64, f64),

        /// Write the resulting transform into this layout file
        #[arg(short, long)]
        layout: Option<PathBuf>,
    },

    /// Export the source once per target frame
    Export {
        /// Image or video file
        file: PathBuf,

        /// Layout file with per-target transforms
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only these targets (repeatable)
        #[arg(short, long = "target")]
        targets: Vec<String>,

        /// Background colour (#RRGGBB, 0xRRGGBB, or a name)
        #[arg(long)]
        background: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reframe_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Check => commands::check::run(&config).await,
        Commands::Targets => commands::targets::run(&config),
        Commands::Probe { file, json } => commands::probe::run(&config, file, json).await,
        Commands::Plan {
            file,
            layout,
            targets,
            background,
        } => commands::plan::run(&config, file, layout, targets, background).await,
        Commands::Replay {
            events,
            media,
            target,
            container,
            layout,
        } => commands::replay::run(&config, events, media, target, container, layout).await,
        Commands::Export {
            file,
            layout,
            output,
            targets,
            background,
        } => commands::export::run(&config, file, layout, output, targets, background).await,
    }
}
