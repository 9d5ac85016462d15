//! Show the header and contents summary of a replay

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use topdown_core::replay::{LoadOutcome, ReplayLog, load_replay};

#[derive(Args)]
pub struct InspectArgs {
    /// Replay file (.dem)
    pub replay: PathBuf,

    /// Print the whole log as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let log = match load_replay(&args.replay) {
        LoadOutcome::Loaded(log) => log,
        LoadOutcome::NoData(header) => {
            println!("Replay: {}", args.replay.display());
            println!("Version: {}", header.format_version);
            println!("No usable records.");
            return Ok(());
        }
        LoadOutcome::Failed(e) => {
            return Err(e)
                .with_context(|| format!("Failed to load replay: {}", args.replay.display()));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&log)?);
        return Ok(());
    }

    print_summary(&args.replay, &log);
    Ok(())
}

fn print_summary(path: &std::path::Path, log: &ReplayLog) {
    let header = &log.header;
    println!("Replay: {}", path.display());
    println!("Version: {}", header.format_version);
    if let (Some(width), Some(height)) = (header.screen_width, header.screen_height) {
        println!("Screen: {}x{}", width, height);
    }
    if let Some(fps) = header.record_fps {
        println!("Record FPS: {}", fps);
    }
    if let Some(start) = header.start_time_epoch {
        println!("Started: {:.3} (unix)", start);
    }

    println!();
    println!("=== Records ===");
    println!("Commands: {}", log.commands.len());
    println!("Input deltas: {}", log.inputs.len());
    println!("Snapshots: {}", log.snapshots.len());
    println!("Duration: {:.3}s", log.total_duration());

    let adrenaline = log.snapshots.iter().filter(|s| s.adrenaline_active).count();
    let sprinting = log.snapshots.iter().filter(|s| s.sprinting).count();
    println!("Sprinting snapshots: {}", sprinting);
    println!("Adrenaline snapshots: {}", adrenaline);

    if let (Some(first), Some(last)) = (log.snapshots.first(), log.snapshots.last()) {
        println!();
        println!(
            "First: {:.3}s at ({:.1}, {:.1})",
            first.timestamp, first.position.x, first.position.y
        );
        println!(
            "Last:  {:.3}s at ({:.1}, {:.1})",
            last.timestamp, last.position.x, last.position.y
        );
    }
}
