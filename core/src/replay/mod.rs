//! Topdown Replay System
//!
//! Recording and deterministic playback of movement sessions:
//!
//! - **Demo format (`.dem`)**: Line-oriented text with commands, input deltas and snapshots
//! - **Control scripts (`.toml`)**: Timed playback commands for headless runs and tests
//!
//! # Architecture
//!
//! ```text
//! Recording:  live actor + keys -> Recorder -> .dem (text)
//! Playback:   .dem -> loader -> PlaybackEngine -> actor, particles, status
//! Headless:   .dem + .toml -> HeadlessRunner -> report.json
//! ```
//!
//! # Usage
//!
//! ## Recording
//!
//! ```ignore
//! use topdown_core::replay::Recorder;
//!
//! let (path, mut recorder) = Recorder::create_in_dir(&dir, &config.recording)?;
//!
//! // During the game loop, after physics:
//! recorder.record_frame(&player, &keys, elapsed)?;
//!
//! recorder.stop()?;
//! ```
//!
//! ## Playback
//!
//! ```ignore
//! use topdown_core::replay::{PlaybackCommand, PlaybackEngine, load_replay};
//!
//! let log = load_replay(&path).into_result()?;
//! let mut engine = PlaybackEngine::new(log, player, config.playback);
//!
//! engine.handle_command(PlaybackCommand::FastForward);
//! loop {
//!     engine.update(frame_delta);
//!     draw(engine.actor(), engine.particles());
//! }
//! ```

mod error;
pub mod format;
pub mod runtime;
pub mod script;
pub mod time_index;
pub mod types;

pub use error::LoadError;

// Re-export core types
pub use types::{
    CommandRecord, InputChange, InputDeltaRecord, InputKey, KeySet, LogHeader, ReplayLog,
    StateSnapshot, Timed,
};

// Re-export text format
pub use format::{CURRENT_FORMAT_VERSION, FILE_EXTENSION, TextReader, TextWriter};

pub use script::{ControlEntry, ControlKind, ControlScript, ScriptError};
pub use time_index::TimeIndex;

// Re-export runtime
pub use runtime::{
    HeadlessConfig, HeadlessRunner, LoadOutcome, Particle, ParticleSystem, PlaybackCommand,
    PlaybackEngine, PlaybackReport, PlaybackState, PlaybackStatus, PlaybackView, Recorder,
    ReplayRenderer, ReplaySession, ReportSummary, RuntimeError, SessionInput, SessionPhase,
    StatusMessage, find_replay_files, load_replay, read_replay,
};
