//! Play a replay headless and report

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use topdown_core::config::Config;
use topdown_core::replay::{HeadlessConfig, HeadlessRunner, find_replay_files};

#[derive(Args)]
pub struct PlayArgs {
    /// Replay file (.dem); the newest file in --dir when omitted
    pub replay: Option<PathBuf>,

    /// Directory searched for the newest replay
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Control script (.toml)
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Output report file (JSON); printed to stdout when omitted
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Fixed ticks per second
    #[arg(long)]
    pub tick_rate: Option<u32>,

    /// Maximum execution time in seconds
    #[arg(long, default_value = "300")]
    pub timeout: u64,
}

pub fn execute(args: PlayArgs, settings: &Config) -> Result<()> {
    let replay = match args.replay {
        Some(path) => path,
        None => find_replay_files(&args.dir)
            .with_context(|| format!("Failed to read directory: {}", args.dir.display()))?
            .pop()
            .with_context(|| format!("No replay files found in {}", args.dir.display()))?,
    };

    let config = HeadlessConfig {
        tick_rate: args.tick_rate.unwrap_or(settings.playback.tick_rate),
        timeout_secs: args.timeout,
        replay_path: None,
    };
    let mut runner =
        HeadlessRunner::from_files(&replay, args.script.as_deref(), settings, config)?;
    let report = runner.execute()?;
    let json = report.to_json().context("Failed to serialize report")?;

    match &args.report {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            println!("Played {} ({} ticks)", replay.display(), report.ticks);
            println!(
                "Final time: {:.3}s / {:.3}s ({})",
                report.final_status.current_time,
                report.summary.total_duration,
                report.final_status.state.label()
            );
            println!("Report written to: {}", path.display());
        }
        None => println!("{}", json),
    }

    tracing::info!(
        "Playback {} after {} ticks, {} stall recoveries",
        report.summary.status,
        report.ticks,
        report.stall_recoveries
    );
    Ok(())
}
