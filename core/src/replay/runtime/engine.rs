//! Playback engine
//!
//! Time-driven state machine that rebuilds actor motion from a loaded log.
//! Commands are replayed through the actor's own integrator at the
//! recording's command cadence; snapshots bracket the current time and pull
//! the actor toward the interpolated ground truth.
//!
//! Cursor positions are always recovered with a binary search over the
//! sequence timestamps, whichever way time moves.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::effects::ParticleSystem;
use crate::actor::{Actor, Key, Player, SimulatedKeys};
use crate::config::PlaybackConfig;
use crate::replay::format::DEFAULT_RECORD_FPS;
use crate::replay::time_index::TimeIndex;
use crate::replay::types::{InputChange, InputKey, KeySet, ReplayLog, StateSnapshot};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Playing,
    Paused,
    FastForward,
    Rewind,
}

impl PlaybackState {
    /// Upper-case label for status displays
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Playing => "PLAYING",
            PlaybackState::Paused => "PAUSED",
            PlaybackState::FastForward => "FAST_FORWARD",
            PlaybackState::Rewind => "REWIND",
        }
    }
}

/// Per-sequence position of the next record to apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackCursor {
    pub command: usize,
    pub input: usize,
    pub snapshot: usize,
}

/// UI-level request to the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    /// Paused resumes playing; anything else pauses
    TogglePause,
    Play,
    Pause,
    FastForward,
    Rewind,
    SpeedUp,
    SpeedDown,
    SetSpeed(f64),
    /// Jump to an absolute time
    Seek(f64),
    /// Jump by an offset from the current time
    SeekBy(f64),
    /// Jump to the middle of the recording
    SeekMiddle,
}

/// Interpolated ground truth for the current time, before smoothing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotTarget {
    pub position: DVec2,
    pub velocity: DVec2,
    pub sprinting: bool,
    pub adrenaline_active: bool,
    /// Position of the current time between the bracket endpoints, in [0, 1]
    pub blend: f64,
}

/// Replays a [`ReplayLog`] into an [`Actor`]
pub struct PlaybackEngine<A: Actor = Player> {
    log: ReplayLog,
    commands: TimeIndex,
    inputs: TimeIndex,
    snapshots: TimeIndex,
    config: PlaybackConfig,
    actor: A,
    keys: SimulatedKeys,
    state: PlaybackState,
    speed: f64,
    current_time: f64,
    total_duration: f64,
    /// Fixed timestep handed to the actor per replayed command
    command_step: f64,
    cursor: PlaybackCursor,
    bracket: Option<(usize, usize)>,
    target: Option<SnapshotTarget>,
    adrenaline_active: bool,
    particles: ParticleSystem,
    stall_recoveries: u64,
}

impl<A: Actor> PlaybackEngine<A> {
    /// Create an engine positioned at time zero, playing at normal speed.
    ///
    /// The actor is placed on the first snapshot when one exists.
    pub fn new(log: ReplayLog, mut actor: A, config: PlaybackConfig) -> Self {
        let fallback_fps = if log.header.format_version <= 1 {
            config.legacy_record_fps
        } else {
            DEFAULT_RECORD_FPS
        };
        let command_step = 1.0 / log.header.record_fps_or(fallback_fps).max(1) as f64;

        if let Some(first) = log.snapshots.first() {
            actor.set_position(first.position);
            actor.set_velocity(first.velocity);
            actor.set_sprinting(first.sprinting);
        }

        let commands = TimeIndex::build(&log.commands);
        let inputs = TimeIndex::build(&log.inputs);
        let snapshots = TimeIndex::build(&log.snapshots);
        let total_duration = log.total_duration();
        let bracket = snapshots.bracket(0.0);
        let speed = 1.0_f64.min(config.max_speed).max(config.min_speed);

        Self {
            log,
            commands,
            inputs,
            snapshots,
            config,
            actor,
            keys: SimulatedKeys::new(),
            state: PlaybackState::Playing,
            speed,
            current_time: 0.0,
            total_duration,
            command_step,
            cursor: PlaybackCursor::default(),
            bracket,
            target: None,
            adrenaline_active: false,
            particles: ParticleSystem::default(),
            stall_recoveries: 0,
        }
    }

    /// Advance playback by one render tick.
    ///
    /// `frame_delta` is the wall-clock interval since the previous tick.
    pub fn update(&mut self, frame_delta: f64) {
        if self.state == PlaybackState::Paused {
            return;
        }
        let frame_delta = if frame_delta.is_finite() {
            frame_delta.max(0.0)
        } else {
            0.0
        };
        let effective_delta = frame_delta * self.speed;

        if self.state == PlaybackState::Rewind
            && frame_delta < self.config.stall_epsilon
            && self.current_time > 0.0
        {
            self.stall_recoveries += 1;
            tracing::debug!(
                "Rewind tick stalled at {:.3}s, resynchronizing cursors",
                self.current_time
            );
            self.resync();
        }

        let direction = match self.state {
            PlaybackState::Playing => 1.0,
            PlaybackState::FastForward => self.config.fast_forward_factor,
            PlaybackState::Rewind => -self.config.rewind_factor,
            PlaybackState::Paused => 0.0,
        };
        self.current_time = self.clamp_time(self.current_time + effective_delta * direction);
        self.bracket = self.snapshots.bracket(self.current_time);

        if self.state == PlaybackState::Rewind {
            self.resync();
        } else {
            self.catch_up();
        }

        self.apply_interpolated_snapshot();
        self.particles.update(frame_delta);
    }

    /// Handle a UI command
    pub fn handle_command(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::TogglePause => {
                self.state = if self.state == PlaybackState::Paused {
                    PlaybackState::Playing
                } else {
                    PlaybackState::Paused
                };
            }
            PlaybackCommand::Play => self.state = PlaybackState::Playing,
            PlaybackCommand::Pause => self.state = PlaybackState::Paused,
            PlaybackCommand::FastForward => self.state = PlaybackState::FastForward,
            PlaybackCommand::Rewind => self.state = PlaybackState::Rewind,
            PlaybackCommand::SpeedUp => self.set_speed(self.speed + self.config.speed_step),
            PlaybackCommand::SpeedDown => self.set_speed(self.speed - self.config.speed_step),
            PlaybackCommand::SetSpeed(speed) => self.set_speed(speed),
            PlaybackCommand::Seek(time) => self.seek(time),
            PlaybackCommand::SeekBy(offset) => self.seek(self.current_time + offset),
            PlaybackCommand::SeekMiddle => self.seek(self.total_duration / 2.0),
        }
    }

    /// Set the playback speed multiplier, clamped to the configured range
    pub fn set_speed(&mut self, speed: f64) {
        if !speed.is_finite() {
            tracing::warn!("Ignoring non-finite playback speed");
            return;
        }
        self.speed = speed
            .min(self.config.max_speed)
            .max(self.config.min_speed);
    }

    /// Jump to `time` (clamped) and rebuild every cursor from it.
    ///
    /// The actor is placed directly on the interpolated snapshot.
    pub fn seek(&mut self, time: f64) {
        if !time.is_finite() {
            tracing::warn!("Ignoring seek to non-finite time");
            return;
        }
        self.current_time = self.clamp_time(time);
        self.resync();
        self.bracket = self.snapshots.bracket(self.current_time);

        if let Some(target) = self.interpolate() {
            self.apply_discrete(&target);
            self.actor.set_position(target.position);
            self.actor.set_velocity(target.velocity);
            self.target = Some(target);
        }
        tracing::debug!("Seek to {:.3}s, cursor {:?}", self.current_time, self.cursor);
    }

    /// Set the held keys from a command sample and step the actor once
    pub fn apply_command(&mut self, held: KeySet) {
        held.apply_to(&mut self.keys);
        self.actor.update(&self.keys, self.command_step);
    }

    /// Apply raw key transitions; unknown keys are skipped with a warning
    pub fn apply_input_changes(&mut self, changes: &[InputChange]) {
        apply_changes(&mut self.keys, changes);
    }

    fn clamp_time(&self, time: f64) -> f64 {
        time.max(0.0).min(self.total_duration)
    }

    /// Point every cursor at the last record at or before the current time
    fn resync(&mut self) {
        let t = self.current_time;
        self.cursor = PlaybackCursor {
            command: self.commands.last_at_or_before(t).unwrap_or(0),
            input: self.inputs.last_at_or_before(t).unwrap_or(0),
            snapshot: self.snapshots.last_at_or_before(t).unwrap_or(0),
        };
    }

    /// Apply, in order, every command and input due by the current time
    fn catch_up(&mut self) {
        let t = self.current_time;

        while let Some(record) = self.log.commands.get(self.cursor.command)
            && record.timestamp <= t
        {
            let held = record.keys_held;
            self.apply_command(held);
            self.cursor.command += 1;
        }

        while let Some(record) = self.log.inputs.get(self.cursor.input)
            && record.timestamp <= t
        {
            apply_changes(&mut self.keys, &record.changes);
            self.cursor.input += 1;
        }

        if let Some(index) = self.snapshots.last_at_or_before(t) {
            self.cursor.snapshot = self.cursor.snapshot.max(index);
        }
    }

    fn interpolate(&self) -> Option<SnapshotTarget> {
        let (prev, next) = self.bracket?;
        let prev: StateSnapshot = self.log.snapshots[prev];
        let next: StateSnapshot = self.log.snapshots[next];

        let span = next.timestamp - prev.timestamp;
        let blend = if span > 0.0 {
            ((self.current_time - prev.timestamp) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let nearest = if blend < 0.5 { prev } else { next };

        Some(SnapshotTarget {
            position: mix(prev.position, next.position, blend),
            velocity: mix(prev.velocity, next.velocity, blend),
            sprinting: nearest.sprinting,
            adrenaline_active: nearest.adrenaline_active,
            blend,
        })
    }

    /// Pull the actor toward the interpolated snapshot
    fn apply_interpolated_snapshot(&mut self) {
        let Some(target) = self.interpolate() else {
            return;
        };
        self.apply_discrete(&target);

        let position = self.actor.position();
        let velocity = self.actor.velocity();
        self.actor
            .set_position(position + (target.position - position) * self.config.position_smoothing);
        self.actor
            .set_velocity(velocity + (target.velocity - velocity) * self.config.velocity_smoothing);
        self.target = Some(target);
    }

    fn apply_discrete(&mut self, target: &SnapshotTarget) {
        if target.adrenaline_active && !self.adrenaline_active {
            self.particles.burst(self.actor.position());
        }
        self.adrenaline_active = target.adrenaline_active;
        self.actor.set_adrenaline_active(target.adrenaline_active);
        self.actor.set_sprinting(target.sprinting);
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Current playback time in seconds, always within `[0, total_duration]`
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Fraction of the recording played, 0 for an empty recording
    pub fn progress(&self) -> f64 {
        if self.total_duration > 0.0 {
            self.current_time / self.total_duration
        } else {
            0.0
        }
    }

    pub fn actor(&self) -> &A {
        &self.actor
    }

    pub fn into_actor(self) -> A {
        self.actor
    }

    /// Simulated key state rebuilt from the log
    pub fn keys(&self) -> &SimulatedKeys {
        &self.keys
    }

    pub fn log(&self) -> &ReplayLog {
        &self.log
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn command_step(&self) -> f64 {
        self.command_step
    }

    pub fn last_snapshot(&self) -> Option<&StateSnapshot> {
        self.bracket.map(|(prev, _)| &self.log.snapshots[prev])
    }

    pub fn next_snapshot(&self) -> Option<&StateSnapshot> {
        self.bracket.map(|(_, next)| &self.log.snapshots[next])
    }

    /// Most recent interpolation target
    pub fn interpolation_target(&self) -> Option<&SnapshotTarget> {
        self.target.as_ref()
    }

    pub fn blend(&self) -> Option<f64> {
        self.target.map(|target| target.blend)
    }

    pub fn adrenaline_active(&self) -> bool {
        self.adrenaline_active
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Number of stalled rewind ticks that forced a cursor resync
    pub fn stall_recoveries(&self) -> u64 {
        self.stall_recoveries
    }
}

/// Linear blend that returns `a` and `b` exactly at 0 and 1
fn mix(a: DVec2, b: DVec2, t: f64) -> DVec2 {
    a * (1.0 - t) + b * t
}

fn apply_changes(keys: &mut SimulatedKeys, changes: &[InputChange]) {
    for change in changes {
        match &change.key {
            InputKey::W => keys.set(Key::W, change.down),
            InputKey::A => keys.set(Key::A, change.down),
            InputKey::S => keys.set(Key::S, change.down),
            InputKey::D => keys.set(Key::D, change.down),
            InputKey::Shift => keys.set_shift(change.down),
            InputKey::Other(name) => tracing::warn!("Ignoring unknown key in input delta: {}", name),
        }
    }
}

#[cfg(test)]
mod tests;
