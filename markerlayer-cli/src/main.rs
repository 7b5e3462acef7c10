//! MarkerLayer CLI - Command-line interface
//!
//! Loads marker files through the proximity-checked store and renders them
//! with the bounded scheduler, or measures distances between coordinates.

mod commands;
mod error;
mod surface;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use markerlayer::logging::{self, LogConfig};

use commands::distance::DistanceArgs;
use commands::load::LoadArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "markerlayer")]
#[command(version, about = "Map marker admission and deferred rendering", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Admit markers from a JSON file and render them
    Load {
        /// JSON array of markers ({"lat", "lon", "id"?, "title"?, ...})
        file: PathBuf,

        /// INI configuration file (default: ./markerlayer.ini if present)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Minimum spacing between markers in meters
        #[arg(long, value_name = "METERS")]
        threshold: Option<f64>,

        /// Maximum renders armed or executing at once
        #[arg(long, value_name = "N")]
        max_concurrent: Option<usize>,

        /// Start with the short steady-state render delay
        #[arg(long)]
        steady: bool,
    },

    /// Great-circle distance between two coordinates
    #[command(allow_negative_numbers = true)]
    Distance {
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,

        /// Also report whether the points fall within this many meters
        #[arg(long, value_name = "METERS")]
        threshold: Option<f64>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut log_config = LogConfig::default();
    if cli.verbose {
        log_config = log_config.with_filter("debug");
    }
    if let Some(path) = cli.log_file {
        log_config = log_config.with_file(path);
    }
    let _log_guard = logging::init(&log_config)?;

    match cli.command {
        Commands::Load {
            file,
            config,
            threshold,
            max_concurrent,
            steady,
        } => commands::load::run(LoadArgs {
            file,
            config,
            threshold,
            max_concurrent,
            steady,
        }),
        Commands::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
            threshold,
        } => commands::distance::run(DistanceArgs {
            lat1,
            lon1,
            lat2,
            lon2,
            threshold,
        })
        .map(|_| ()),
    }
}
