//! Locus CLI - tag, ground and segment objects in images.
//!
//! Locus runs an image through three stages: tagging (RAM++, or LLaVA
//! description followed by DeepSeek keyword extraction), location with
//! Grounding DINO, and segmentation with SAM2.
//!
//! # Usage
//!
//! ```bash
//! # Run the full pipeline on one image
//! locus run desk.jpg
//!
//! # Several images with RAM++ tagging, saving artifacts; prints the mean time
//! locus run a.jpg b.jpg c.jpg --tagging ram_plus --save
//!
//! # Location stage only, using the newest tag file
//! locus locate desk.jpg --save
//!
//! # View configuration
//! locus config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Locus - tag, ground and segment objects in images.
#[derive(Parser, Debug)]
#[command(name = "locus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "LOCUS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run tagging, location and segmentation on one or more images
    Run(cli::run::RunArgs),

    /// Run the location stage alone on tags from the newest tag file
    Locate(cli::locate::LocateArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match cli::config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => return Err(e.into()),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `locus config path`."
            );
            locus_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Locus v{}", locus_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Locate(args) => cli::locate::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config.as_deref()).await,
    }
}
