//! List replay files in a directory

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use topdown_core::replay::{LoadOutcome, find_replay_files, load_replay};

#[derive(Args)]
pub struct ListArgs {
    /// Directory to search
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

pub fn execute(args: ListArgs) -> Result<()> {
    let files = find_replay_files(&args.dir)
        .with_context(|| format!("Failed to read directory: {}", args.dir.display()))?;

    if files.is_empty() {
        println!("No replay files in {}", args.dir.display());
        return Ok(());
    }

    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match load_replay(path) {
            LoadOutcome::Loaded(log) => println!(
                "{:<40} v{}  {:>8.2}s  {:>6} snapshots",
                name,
                log.header.format_version,
                log.total_duration(),
                log.snapshots.len()
            ),
            LoadOutcome::NoData(header) => {
                println!("{:<40} v{}  (no data)", name, header.format_version)
            }
            LoadOutcome::Failed(e) => println!("{:<40} invalid: {}", name, e),
        }
    }
    println!();
    println!("{} replay file(s)", files.len());

    Ok(())
}
