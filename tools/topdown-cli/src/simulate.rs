//! Record a scripted movement session
//!
//! Drives a [`Player`] with a repeating key pattern at a fixed frame rate
//! and records it exactly as the interactive demo would.

use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;

use topdown_core::config::Config;
use topdown_core::replay::Recorder;
use topdown_core::{Actor, Key, Player, SimulatedKeys};

#[derive(Args)]
pub struct SimulateArgs {
    /// Output file (.dem); a timestamped name inside --dir when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for timestamped recordings
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Seconds to record
    #[arg(long, default_value = "5.0")]
    pub seconds: f64,

    /// Simulation frames per second
    #[arg(long, default_value = "60")]
    pub fps: u32,

    /// Held keys per segment, e.g. `D,D+SHIFT,-,W` (`-` holds nothing)
    #[arg(long, value_delimiter = ',', default_value = "D,D+SHIFT,S,A,W")]
    pub pattern: Vec<String>,

    /// Seconds each pattern segment lasts
    #[arg(long, default_value = "1.0")]
    pub segment: f64,

    /// Time at which adrenaline switches on for one second
    #[arg(long)]
    pub adrenaline_at: Option<f64>,
}

pub fn execute(args: SimulateArgs, settings: &Config) -> Result<()> {
    if !(args.seconds.is_finite() && args.seconds > 0.0) {
        bail!("--seconds must be a positive number");
    }
    if !(args.segment.is_finite() && args.segment > 0.0) {
        bail!("--segment must be a positive number");
    }
    let pattern = args
        .pattern
        .iter()
        .map(|segment| parse_segment(segment))
        .collect::<Result<Vec<_>>>()?;
    if pattern.is_empty() {
        bail!("--pattern needs at least one segment");
    }

    let recording = &settings.recording;
    let (path, mut recorder) = match &args.output {
        Some(path) => (
            path.clone(),
            Recorder::create(path, recording)
                .with_context(|| format!("Failed to create recording: {}", path.display()))?,
        ),
        None => Recorder::create_in_dir(&args.dir, recording)
            .with_context(|| format!("Failed to create recording in {}", args.dir.display()))?,
    };

    let width = recording.screen_width as f64;
    let height = recording.screen_height as f64;
    let mut player = Player::centered(settings.physics.clone(), width, height);

    let fps = args.fps.max(1);
    let dt = 1.0 / fps as f64;
    let frames = (args.seconds * fps as f64).round() as u64;

    for frame in 1..=frames {
        let elapsed = frame as f64 * dt;
        let keys = keys_at(&pattern, args.segment, elapsed - dt);
        player.adrenaline = args
            .adrenaline_at
            .is_some_and(|start| elapsed >= start && elapsed < start + 1.0);

        player.update(&keys, dt);
        player.clamp_to_bounds(width, height);
        recorder
            .record_frame(&player, &keys, elapsed)
            .with_context(|| format!("Failed to write recording: {}", path.display()))?;
    }

    let frame_count = recorder.frame_count();
    recorder
        .stop()
        .with_context(|| format!("Failed to finish recording: {}", path.display()))?;

    println!("Recorded {} frames to {}", frame_count, path.display());
    println!(
        "Final position: ({:.1}, {:.1})",
        player.position().x,
        player.position().y
    );
    Ok(())
}

/// Keys held for one `+`-joined pattern segment
fn parse_segment(segment: &str) -> Result<SimulatedKeys> {
    let mut keys = SimulatedKeys::new();
    let segment = segment.trim();
    if segment.is_empty() || segment == "-" {
        return Ok(keys);
    }

    for token in segment.split('+').map(str::trim) {
        match token.to_ascii_uppercase().as_str() {
            "W" => keys.set(Key::W, true),
            "A" => keys.set(Key::A, true),
            "S" => keys.set(Key::S, true),
            "D" => keys.set(Key::D, true),
            "SHIFT" => keys.set(Key::LeftShift, true),
            _ => bail!("Unknown key {:?} in pattern segment {:?}", token, segment),
        }
    }
    Ok(keys)
}

fn keys_at(pattern: &[SimulatedKeys], segment: f64, time: f64) -> SimulatedKeys {
    let index = (time.max(0.0) / segment) as usize % pattern.len();
    pattern[index]
}
