//! Headless replay execution
//!
//! Drives a [`PlaybackEngine`] at a fixed tick rate without graphics or
//! window management, applying timed controls from a script and sampling
//! the playback state into a JSON-serializable report. Ideal for CI/testing.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use super::engine::{PlaybackCommand, PlaybackEngine};
use super::loader::load_replay;
use super::session::PlaybackStatus;
use crate::actor::{Actor, Player};
use crate::config::Config;
use crate::replay::script::ControlScript;

/// Headless runner configuration
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Fixed ticks per second
    pub tick_rate: u32,
    /// Maximum execution time in seconds
    pub timeout_secs: u64,
    /// Replay file path (for reporting)
    pub replay_path: Option<String>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            timeout_secs: 300,
            replay_path: None,
        }
    }
}

/// Headless replay runner
pub struct HeadlessRunner<A: Actor = Player> {
    engine: PlaybackEngine<A>,
    controls: Vec<(f64, PlaybackCommand)>,
    duration: f64,
    sample_interval: f64,
    config: HeadlessConfig,
}

impl HeadlessRunner<Player> {
    /// Load a replay and an optional control script from disk
    pub fn from_files(
        replay_path: &Path,
        script_path: Option<&Path>,
        settings: &Config,
        config: HeadlessConfig,
    ) -> Result<Self> {
        let log = load_replay(replay_path)
            .into_result()
            .with_context(|| format!("Failed to load replay: {}", replay_path.display()))?;

        let script = match script_path {
            Some(path) => ControlScript::from_file(path)
                .with_context(|| format!("Failed to parse script: {}", path.display()))?,
            None => ControlScript::default(),
        };

        let width = log.header.screen_width.unwrap_or(1920) as f64;
        let height = log.header.screen_height.unwrap_or(1080) as f64;
        let player = Player::centered(settings.physics.clone(), width, height);
        let engine = PlaybackEngine::new(log, player, settings.playback.clone());

        let mut runner_config = config;
        runner_config.replay_path = Some(replay_path.display().to_string());
        Self::new(engine, &script, runner_config)
    }
}

impl<A: Actor> HeadlessRunner<A> {
    /// Create a runner over an engine that has not been ticked yet
    pub fn new(engine: PlaybackEngine<A>, script: &ControlScript, config: HeadlessConfig) -> Result<Self> {
        let controls = script.compile().context("Failed to compile control script")?;
        let duration = script
            .duration
            .unwrap_or(engine.total_duration() + 1.0)
            .max(0.0);

        Ok(Self {
            engine,
            controls,
            duration,
            sample_interval: script.sample_interval,
            config,
        })
    }

    /// Run to the end of the script and report
    pub fn execute(&mut self) -> Result<PlaybackReport> {
        let start = Instant::now();
        let dt = 1.0 / self.config.tick_rate.max(1) as f64;
        let total_ticks = (self.duration / dt).round() as u64;

        let mut next_control = 0;
        let mut next_sample = self.sample_interval;
        let mut samples = Vec::new();
        let mut ticks = 0;
        let mut timed_out = false;

        for tick in 0..total_ticks {
            if start.elapsed().as_secs() > self.config.timeout_secs {
                tracing::warn!("Headless playback timed out after {} ticks", tick);
                timed_out = true;
                break;
            }

            let now = tick as f64 * dt;
            while let Some(&(at, command)) = self.controls.get(next_control)
                && at <= now + 1e-9
            {
                tracing::debug!("{:.3}s: {:?}", now, command);
                self.engine.handle_command(command);
                next_control += 1;
            }

            self.engine.update(dt);
            ticks += 1;

            let wall_time = (tick + 1) as f64 * dt;
            if self.sample_interval > 0.0 && wall_time + 1e-9 >= next_sample {
                samples.push(PlaybackSample {
                    wall_time,
                    status: PlaybackStatus::capture(&self.engine),
                });
                next_sample += self.sample_interval;
            }
        }

        let log = self.engine.log();
        let final_status = PlaybackStatus::capture(&self.engine);
        Ok(PlaybackReport {
            version: "1.0".to_string(),
            replay: self.config.replay_path.clone(),
            executed_at: Some(chrono::Utc::now().to_rfc3339()),
            duration_ms: Some(start.elapsed().as_millis() as u64),
            format_version: log.header.format_version,
            ticks,
            wall_seconds: ticks as f64 * dt,
            controls_applied: next_control,
            stall_recoveries: self.engine.stall_recoveries(),
            samples,
            summary: ReportSummary {
                commands: log.commands.len(),
                inputs: log.inputs.len(),
                snapshots: log.snapshots.len(),
                total_duration: self.engine.total_duration(),
                reached_end: final_status.current_time >= self.engine.total_duration(),
                status: if timed_out { "timeout" } else { "completed" }.to_string(),
            },
            final_status,
        })
    }

    /// Get the engine (for testing)
    pub fn engine(&self) -> &PlaybackEngine<A> {
        &self.engine
    }
}

/// Playback state captured at one wall-clock instant
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSample {
    /// Seconds since the run started
    pub wall_time: f64,
    #[serde(flatten)]
    pub status: PlaybackStatus,
}

/// Headless run report
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackReport {
    /// Report format version
    pub version: String,
    /// Replay file (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay: Option<String>,
    /// Execution timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<String>,
    /// Execution duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub format_version: u32,
    pub ticks: u64,
    /// Simulated wall-clock seconds
    pub wall_seconds: f64,
    pub controls_applied: usize,
    pub stall_recoveries: u64,
    pub samples: Vec<PlaybackSample>,
    pub final_status: PlaybackStatus,
    pub summary: ReportSummary,
}

/// Report summary
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub commands: usize,
    pub inputs: usize,
    pub snapshots: usize,
    pub total_duration: f64,
    /// Playback finished at the last record
    pub reached_end: bool,
    /// Overall status
    pub status: String,
}

impl PlaybackReport {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
