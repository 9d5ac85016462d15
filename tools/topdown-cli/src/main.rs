//! Topdown CLI - Recording and replay tool for the top-down demo
//!
//! # Commands
//!
//! - `topdown list` - List replay files in a directory
//! - `topdown inspect` - Show the header and record counts of a replay
//! - `topdown simulate` - Drive the player with a scripted key pattern and record it
//! - `topdown play` - Play a replay headless and write a JSON report
//!
//! # Usage
//!
//! ```bash
//! # Record five seconds of scripted movement into ./recordings
//! topdown simulate --dir recordings --seconds 5 --pattern D,D+SHIFT,S,A
//!
//! # Replay the newest recording with timed controls
//! topdown play --dir recordings --script controls.toml --report report.json
//! ```
//!
//! Settings come from `config.toml` in the platform config directory unless
//! `--config` names another file.

mod inspect;
mod list;
mod play;
mod simulate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use topdown_core::config;

/// Topdown CLI - Recording and replay tool for the top-down demo
#[derive(Parser)]
#[command(name = "topdown")]
#[command(about = "Record, inspect and replay top-down demo logs")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List replay files in a directory
    List(list::ListArgs),

    /// Show the header and record counts of a replay
    Inspect(inspect::InspectArgs),

    /// Record a scripted movement session
    Simulate(simulate::SimulateArgs),

    /// Play a replay headless and report
    Play(play::PlayArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    };

    match cli.command {
        Commands::List(args) => list::execute(args),
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Simulate(args) => simulate::execute(args, &settings),
        Commands::Play(args) => play::execute(args, &settings),
    }
}
