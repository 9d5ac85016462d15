//! Configuration management (config.toml)
//!
//! Handles loading, saving, and providing defaults for recording, playback
//! and movement settings. Settings are stored in TOML format in the
//! platform-specific config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Demo configuration.
///
/// Contains all user-configurable settings organized into sections.
/// Serialized to/from TOML format for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Recording settings
    #[serde(default)]
    pub recording: RecordingConfig,
    /// Replay playback settings
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Movement model settings
    #[serde(default)]
    pub physics: PhysicsConfig,
}

/// Recorder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Log format version written to the header (default: 2)
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    /// Command record cadence in Hz (default: 64)
    #[serde(default = "default_record_fps")]
    pub record_fps: u32,
    /// Seconds between state snapshots (default: 0.2)
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: f64,
    /// Screen width written to the header (default: 1920)
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,
    /// Screen height written to the header (default: 1080)
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,
}

/// Playback engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Render loop rate in Hz (default: 60)
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Lowest playback speed multiplier (default: 0.1)
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,
    /// Highest playback speed multiplier (default: 5.0)
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    /// Speed change per speed up/down command (default: 0.5)
    #[serde(default = "default_speed_step")]
    pub speed_step: f64,
    /// Time multiplier while fast-forwarding (default: 2.0)
    #[serde(default = "default_direction_factor")]
    pub fast_forward_factor: f64,
    /// Time multiplier while rewinding (default: 2.0)
    #[serde(default = "default_direction_factor")]
    pub rewind_factor: f64,
    /// Fraction of the position error corrected per tick (default: 0.3)
    #[serde(default = "default_position_smoothing")]
    pub position_smoothing: f64,
    /// Fraction of the velocity error corrected per tick (default: 0.5)
    #[serde(default = "default_velocity_smoothing")]
    pub velocity_smoothing: f64,
    /// Tick interval below which a rewind tick counts as stalled (default: 0.001)
    #[serde(default = "default_stall_epsilon")]
    pub stall_epsilon: f64,
    /// Seconds a status message stays on screen (default: 3.0)
    #[serde(default = "default_message_seconds")]
    pub message_seconds: f64,
    /// RECORD_FPS assumed for version 1 logs without the header (default: 8)
    #[serde(default = "default_legacy_record_fps")]
    pub legacy_record_fps: u32,
}

/// Movement model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Top walking speed in px/s (default: 250)
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f64,
    /// Top sprinting speed in px/s (default: 320)
    #[serde(default = "default_sprint_speed")]
    pub sprint_speed: f64,
    /// Acceleration factor (default: 20)
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,
    /// Friction coefficient (default: 5)
    #[serde(default = "default_friction")]
    pub friction: f64,
    /// Square player side in px, used for bounds clamping (default: 80)
    #[serde(default = "default_player_size")]
    pub player_size: f64,
}

fn default_format_version() -> u32 {
    2
}
fn default_record_fps() -> u32 {
    64
}
fn default_snapshot_interval() -> f64 {
    0.2
}
fn default_screen_width() -> u32 {
    1920
}
fn default_screen_height() -> u32 {
    1080
}

fn default_tick_rate() -> u32 {
    60
}
fn default_min_speed() -> f64 {
    0.1
}
fn default_max_speed() -> f64 {
    5.0
}
fn default_speed_step() -> f64 {
    0.5
}
fn default_direction_factor() -> f64 {
    2.0
}
fn default_position_smoothing() -> f64 {
    0.3
}
fn default_velocity_smoothing() -> f64 {
    0.5
}
fn default_stall_epsilon() -> f64 {
    0.001
}
fn default_message_seconds() -> f64 {
    3.0
}
fn default_legacy_record_fps() -> u32 {
    8
}

fn default_walk_speed() -> f64 {
    250.0
}
fn default_sprint_speed() -> f64 {
    320.0
}
fn default_acceleration() -> f64 {
    20.0
}
fn default_friction() -> f64 {
    5.0
}
fn default_player_size() -> f64 {
    80.0
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            format_version: default_format_version(),
            record_fps: default_record_fps(),
            snapshot_interval: default_snapshot_interval(),
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            speed_step: default_speed_step(),
            fast_forward_factor: default_direction_factor(),
            rewind_factor: default_direction_factor(),
            position_smoothing: default_position_smoothing(),
            velocity_smoothing: default_velocity_smoothing(),
            stall_epsilon: default_stall_epsilon(),
            message_seconds: default_message_seconds(),
            legacy_record_fps: default_legacy_record_fps(),
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            walk_speed: default_walk_speed(),
            sprint_speed: default_sprint_speed(),
            acceleration: default_acceleration(),
            friction: default_friction(),
            player_size: default_player_size(),
        }
    }
}

impl PlaybackConfig {
    /// Fixed timestep of one render tick in seconds.
    pub fn tick_seconds(&self) -> f64 {
        1.0 / self.tick_rate.max(1) as f64
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\Topdown\config`
/// On macOS: `~/Library/Application Support/io.topdown.Topdown`
/// On Linux: `~/.config/Topdown`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.topdown", "", "Topdown")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from disk.
///
/// Reads `config.toml` from the platform's configuration directory.
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    config_dir()
        .map(|dir| load_from(&dir.join("config.toml")))
        .unwrap_or_default()
}

/// Loads the configuration from an explicit path, falling back to defaults.
pub fn load_from(path: &Path) -> Config {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                None
            }
        })
        .unwrap_or_default()
}

/// Saves the configuration to disk.
///
/// Writes `config.toml` to the platform's configuration directory.
/// Creates the directory if it doesn't exist.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file
/// cannot be written.
pub fn save(config: &Config) -> std::io::Result<()> {
    if let Some(dir) = config_dir() {
        save_to(config, &dir.join("config.toml"))?;
    }
    Ok(())
}

/// Saves the configuration to an explicit path.
pub fn save_to(config: &Config, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.recording.format_version, 2);
        assert_eq!(config.recording.record_fps, 64);
        assert_eq!(config.recording.snapshot_interval, 0.2);
        assert_eq!(config.playback.min_speed, 0.1);
        assert_eq!(config.playback.max_speed, 5.0);
        assert_eq!(config.playback.legacy_record_fps, 8);
        assert_eq!(config.physics.walk_speed, 250.0);
        assert_eq!(config.physics.sprint_speed, 320.0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[playback]
max_speed = 4.0

[physics]
friction = 6.5
"#,
        )
        .unwrap();

        assert_eq!(config.playback.max_speed, 4.0);
        assert_eq!(config.playback.min_speed, 0.1);
        assert_eq!(config.physics.friction, 6.5);
        assert_eq!(config.recording, RecordingConfig::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.recording.record_fps = 30;
        config.playback.speed_step = 0.25;
        save_to(&config, &path).unwrap();

        assert_eq!(load_from(&path), config);
    }

    #[test]
    fn test_invalid_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "recording = [not toml").unwrap();

        assert_eq!(load_from(&path), Config::default());
        assert_eq!(load_from(&dir.path().join("missing.toml")), Config::default());
    }

    #[test]
    fn test_tick_seconds() {
        let playback = PlaybackConfig {
            tick_rate: 50,
            ..Default::default()
        };
        assert_eq!(playback.tick_seconds(), 0.02);
    }
}
