//! Playback control scripts (.toml)
//!
//! Timed UI commands for driving playback without a window, used by the
//! headless runner and in tests.
//!
//! # Example Script
//!
//! ```toml
//! duration = 8.0
//! sample_interval = 0.5
//!
//! controls = [
//!   { at = 1.0, command = "fast_forward" },
//!   { at = 2.0, command = "rewind" },
//!   { at = 3.0, command = "set_speed", value = 0.5 },
//!   { at = 4.0, command = "seek", value = 1.25 },
//!   { at = 5.0, command = "toggle_pause" },
//! ]
//! ```
//!
//! `at` is wall-clock seconds since the run started, not replay time.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::replay::runtime::PlaybackCommand;

/// Complete control script file (TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlScript {
    /// Wall-clock seconds to run; defaults to the replay length plus one second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Seconds between report samples (0 disables sampling)
    #[serde(default = "default_sample_interval")]
    pub sample_interval: f64,

    /// Timed commands
    #[serde(default)]
    pub controls: Vec<ControlEntry>,
}

fn default_sample_interval() -> f64 {
    0.5
}

impl Default for ControlScript {
    fn default() -> Self {
        Self {
            duration: None,
            sample_interval: default_sample_interval(),
            controls: Vec::new(),
        }
    }
}

/// One timed command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlEntry {
    /// Wall-clock seconds since the run started
    pub at: f64,
    pub command: ControlKind,
    /// Argument for `set_speed`, `seek` and `seek_by`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Command names accepted in scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    TogglePause,
    Play,
    Pause,
    FastForward,
    Rewind,
    SpeedUp,
    SpeedDown,
    SetSpeed,
    Seek,
    SeekBy,
    SeekMiddle,
}

/// Script loading or validation error
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("TOML parse error: {0}")]
    Toml(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("control at {at}s: `{command:?}` needs a value")]
    MissingValue { at: f64, command: ControlKind },
    #[error("control time must be a finite, non-negative number, got {0}")]
    InvalidTime(f64),
}

impl ControlScript {
    /// Parse a control script from a string
    pub fn from_toml(toml_str: &str) -> Result<Self, ScriptError> {
        toml::from_str(toml_str).map_err(|e| ScriptError::Toml(e.to_string()))
    }

    /// Parse a control script from a file
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String, ScriptError> {
        toml::to_string_pretty(self).map_err(|e| ScriptError::Toml(e.to_string()))
    }

    /// Resolve every entry to an engine command, ordered by time.
    ///
    /// Entries sharing a time keep their file order.
    pub fn compile(&self) -> Result<Vec<(f64, PlaybackCommand)>, ScriptError> {
        let mut compiled = self
            .controls
            .iter()
            .map(|entry| entry.to_command().map(|command| (entry.at, command)))
            .collect::<Result<Vec<_>, ScriptError>>()?;
        compiled.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(compiled)
    }
}

impl ControlEntry {
    pub fn to_command(&self) -> Result<PlaybackCommand, ScriptError> {
        if !self.at.is_finite() || self.at < 0.0 {
            return Err(ScriptError::InvalidTime(self.at));
        }
        let value = || {
            self.value.ok_or(ScriptError::MissingValue {
                at: self.at,
                command: self.command,
            })
        };

        Ok(match self.command {
            ControlKind::TogglePause => PlaybackCommand::TogglePause,
            ControlKind::Play => PlaybackCommand::Play,
            ControlKind::Pause => PlaybackCommand::Pause,
            ControlKind::FastForward => PlaybackCommand::FastForward,
            ControlKind::Rewind => PlaybackCommand::Rewind,
            ControlKind::SpeedUp => PlaybackCommand::SpeedUp,
            ControlKind::SpeedDown => PlaybackCommand::SpeedDown,
            ControlKind::SetSpeed => PlaybackCommand::SetSpeed(value()?),
            ControlKind::Seek => PlaybackCommand::Seek(value()?),
            ControlKind::SeekBy => PlaybackCommand::SeekBy(value()?),
            ControlKind::SeekMiddle => PlaybackCommand::SeekMiddle,
        })
    }
}
