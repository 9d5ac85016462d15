//! Replay runtime
//!
//! This module contains the execution infrastructure for replays:
//! - **Recorder**: Captures live movement into a `.dem` log
//! - **Loader**: Reads logs from disk, reporting partial or failed loads
//! - **Engine**: Deterministic playback with seek, rewind and speed control
//! - **Session**: Frame driver tying the engine to a renderer and status messages
//! - **Headless**: Headless execution for CI/testing

mod effects;
mod engine;
mod headless;
mod loader;
mod recorder;
mod session;

pub use effects::{Particle, ParticleSystem};
pub use engine::{PlaybackCommand, PlaybackCursor, PlaybackEngine, PlaybackState, SnapshotTarget};
pub use headless::{HeadlessConfig, HeadlessRunner, PlaybackReport, PlaybackSample, ReportSummary};
pub use loader::{LoadOutcome, find_replay_files, load_replay, read_replay};
pub use recorder::{Recorder, recording_file_name};
pub use session::{
    MessageKind, PlaybackStatus, PlaybackView, ReplayRenderer, ReplaySession, RuntimeError,
    SessionInput, SessionPhase, StatusMessage,
};
