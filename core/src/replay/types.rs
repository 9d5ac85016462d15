//! Core types for the replay system
//!
//! This module defines the in-memory records shared by the recorder, the
//! text log format and the playback engine.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::actor::{Key, SimulatedKeys};

/// Complete replay data (in-memory representation)
///
/// The three sequences are each sorted ascending by timestamp and are not
/// mutated after loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayLog {
    pub header: LogHeader,
    pub commands: Vec<CommandRecord>,
    pub inputs: Vec<InputDeltaRecord>,
    pub snapshots: Vec<StateSnapshot>,
}

impl ReplayLog {
    /// Latest timestamp across all three sequences, never negative
    pub fn total_duration(&self) -> f64 {
        let last = |t: Option<f64>| t.unwrap_or(0.0);
        last(self.commands.last().map(Timed::timestamp))
            .max(last(self.inputs.last().map(Timed::timestamp)))
            .max(last(self.snapshots.last().map(Timed::timestamp)))
            .max(0.0)
    }

    /// True when no records of any kind were loaded
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.inputs.is_empty() && self.snapshots.is_empty()
    }
}

/// Header block of a log file.
///
/// Keys missing from the file stay `None`; callers supply their own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogHeader {
    /// Declared format version (1 when the file never declares one)
    pub format_version: u32,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    /// Command cadence used while recording
    pub record_fps: Option<u32>,
    /// Wall-clock time the recording started, seconds since the Unix epoch
    pub start_time_epoch: Option<f64>,
}

impl Default for LogHeader {
    fn default() -> Self {
        Self {
            format_version: 1,
            screen_width: None,
            screen_height: None,
            record_fps: None,
            start_time_epoch: None,
        }
    }
}

impl LogHeader {
    /// Command cadence, or `fallback` when the file has no `RECORD_FPS`
    pub fn record_fps_or(&self, fallback: u32) -> u32 {
        self.record_fps.filter(|fps| *fps > 0).unwrap_or(fallback)
    }
}

/// Anything placed on the replay time axis.
pub trait Timed {
    /// Seconds since recording start
    fn timestamp(&self) -> f64;
}

bitflags::bitflags! {
    /// Abstract movement keys held at a command sample
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct KeySet: u8 {
        const FORWARD = 0b0000_0001;
        const BACK = 0b0000_0010;
        const LEFT = 0b0000_0100;
        const RIGHT = 0b0000_1000;
        const SPRINT = 0b0001_0000;
    }
}

impl Serialize for KeySet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KeySet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(KeySet::from_bits_truncate(bits))
    }
}

impl KeySet {
    /// Log tokens in the fixed order they are written
    pub const TOKENS: [(KeySet, &'static str); 5] = [
        (KeySet::FORWARD, "W"),
        (KeySet::BACK, "S"),
        (KeySet::LEFT, "A"),
        (KeySet::RIGHT, "D"),
        (KeySet::SPRINT, "SHIFT"),
    ];

    /// Sample the abstract keys from raw key state
    pub fn from_keys(keys: &SimulatedKeys) -> Self {
        let mut set = KeySet::empty();
        set.set(KeySet::FORWARD, keys.is_down(Key::W));
        set.set(KeySet::BACK, keys.is_down(Key::S));
        set.set(KeySet::LEFT, keys.is_down(Key::A));
        set.set(KeySet::RIGHT, keys.is_down(Key::D));
        set.set(KeySet::SPRINT, keys.shift());
        set
    }

    /// Overwrite `keys` so exactly this set is held
    pub fn apply_to(self, keys: &mut SimulatedKeys) {
        keys.set(Key::W, self.contains(KeySet::FORWARD));
        keys.set(Key::S, self.contains(KeySet::BACK));
        keys.set(Key::A, self.contains(KeySet::LEFT));
        keys.set(Key::D, self.contains(KeySet::RIGHT));
        keys.set_shift(self.contains(KeySet::SPRINT));
    }

    /// Look up a single command token (`W`, `S`, `A`, `D`, `SHIFT`)
    pub fn from_token(token: &str) -> Option<Self> {
        Self::TOKENS
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(token))
            .map(|(flag, _)| *flag)
    }

    /// Comma-joined tokens, e.g. `W,A,SHIFT`
    pub fn to_token_list(self) -> String {
        Self::TOKENS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Periodic "which keys are held" sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub timestamp: f64,
    pub keys_held: KeySet,
}

/// Raw key named in an input delta
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputKey {
    W,
    A,
    S,
    D,
    /// Both shift keys
    Shift,
    /// Key name this build does not simulate; ignored on playback
    Other(String),
}

impl InputKey {
    /// Monitored keys in the order the recorder checks them
    pub const MONITORED: [InputKey; 5] = [
        InputKey::W,
        InputKey::A,
        InputKey::S,
        InputKey::D,
        InputKey::Shift,
    ];

    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "W" => InputKey::W,
            "A" => InputKey::A,
            "S" => InputKey::S,
            "D" => InputKey::D,
            "SHIFT" => InputKey::Shift,
            _ => InputKey::Other(name.trim().to_string()),
        }
    }

    pub fn token(&self) -> &str {
        match self {
            InputKey::W => "W",
            InputKey::A => "A",
            InputKey::S => "S",
            InputKey::D => "D",
            InputKey::Shift => "SHIFT",
            InputKey::Other(name) => name,
        }
    }

    /// Current state of this key in `keys`; `None` for unsimulated keys
    pub fn read(&self, keys: &SimulatedKeys) -> Option<bool> {
        match self {
            InputKey::W => Some(keys.is_down(Key::W)),
            InputKey::A => Some(keys.is_down(Key::A)),
            InputKey::S => Some(keys.is_down(Key::S)),
            InputKey::D => Some(keys.is_down(Key::D)),
            InputKey::Shift => Some(keys.shift()),
            InputKey::Other(_) => None,
        }
    }
}

/// One key transition inside an input delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputChange {
    pub key: InputKey,
    pub down: bool,
}

/// Edge-triggered batch of key transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDeltaRecord {
    pub timestamp: f64,
    pub changes: Vec<InputChange>,
}

/// Periodic ground-truth sample of the actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub timestamp: f64,
    pub position: DVec2,
    pub velocity: DVec2,
    pub sprinting: bool,
    pub adrenaline_active: bool,
}

impl Timed for CommandRecord {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

impl Timed for InputDeltaRecord {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

impl Timed for StateSnapshot {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}
