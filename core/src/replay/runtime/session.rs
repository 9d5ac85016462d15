//! Replay session
//!
//! Outer loop around a [`PlaybackEngine`]: turns load outcomes into status
//! messages, forwards UI input, hands a read-only view to the renderer each
//! frame, and aborts playback on a runtime error instead of crashing.

use std::fmt;
use std::path::Path;

use glam::DVec2;
use serde::Serialize;

use super::effects::Particle;
use super::engine::{PlaybackCommand, PlaybackEngine, PlaybackState};
use super::loader::{LoadOutcome, find_replay_files, load_replay};
use crate::actor::{Actor, Player};
use crate::config::PlaybackConfig;

/// User-visible problem categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    NoReplayFiles,
    InvalidFile,
    NoData,
    RuntimeFailure,
}

impl MessageKind {
    pub fn text(self) -> &'static str {
        match self {
            MessageKind::NoReplayFiles => "No replay files found",
            MessageKind::InvalidFile => "Replay file is invalid or corrupt",
            MessageKind::NoData => "Replay file has no usable records",
            MessageKind::RuntimeFailure => "Replay playback failed",
        }
    }
}

/// Transient on-screen message with a bounded lifetime
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub kind: MessageKind,
    pub detail: Option<String>,
    remaining: f64,
}

impl StatusMessage {
    pub fn new(kind: MessageKind, seconds: f64) -> Self {
        Self {
            kind,
            detail: None,
            remaining: seconds.max(0.0),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Display text, with the detail appended when present
    pub fn text(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}: {}", self.kind.text(), detail),
            None => self.kind.text().to_string(),
        }
    }

    /// Seconds left on screen
    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn tick(&mut self, dt: f64) {
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
    }

    pub fn dismiss(&mut self) {
        self.remaining = 0.0;
    }
}

/// Runtime error raised while driving a frame
#[derive(Debug, Clone)]
pub struct RuntimeError(pub String);

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engine readouts for displays and reports
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackStatus {
    pub current_time: f64,
    pub total_duration: f64,
    pub state: PlaybackState,
    pub speed: f64,
    pub progress: f64,
    pub position: DVec2,
    pub velocity: DVec2,
    pub sprinting: bool,
    pub adrenaline_active: bool,
}

impl PlaybackStatus {
    pub fn capture<A: Actor>(engine: &PlaybackEngine<A>) -> Self {
        let actor = engine.actor();
        Self {
            current_time: engine.current_time(),
            total_duration: engine.total_duration(),
            state: engine.state(),
            speed: engine.speed(),
            progress: engine.progress(),
            position: actor.position(),
            velocity: actor.velocity(),
            sprinting: actor.is_sprinting(),
            adrenaline_active: engine.adrenaline_active(),
        }
    }
}

/// Everything a renderer may read for one frame
#[derive(Debug, Clone, Copy)]
pub struct PlaybackView<'a> {
    /// `None` once playback is over or never started
    pub playback: Option<PlaybackStatus>,
    pub particles: &'a [Particle],
    /// Visible status message, if any
    pub message: Option<&'a StatusMessage>,
}

/// Rendering collaborator
pub trait ReplayRenderer {
    /// Draw one frame
    fn render(&mut self, view: &PlaybackView<'_>) -> anyhow::Result<()>;
}

/// Input for one session frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionInput {
    Command(PlaybackCommand),
    DismissMessage,
    Exit,
}

/// Where the session stands after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Playing,
    /// Playback never started or was stopped by an error
    Aborted,
    /// The user left playback
    Exited,
}

/// Outer playback loop state
pub struct ReplaySession<R: ReplayRenderer, A: Actor = Player> {
    engine: Option<PlaybackEngine<A>>,
    renderer: R,
    message: Option<StatusMessage>,
    message_seconds: f64,
    phase: SessionPhase,
}

impl<R: ReplayRenderer, A: Actor> ReplaySession<R, A> {
    /// Start a session from a load result
    pub fn from_outcome(outcome: LoadOutcome, actor: A, config: PlaybackConfig, renderer: R) -> Self {
        let mut session = Self::idle(&config, renderer);
        match outcome {
            LoadOutcome::Loaded(log) => {
                session.engine = Some(PlaybackEngine::new(log, actor, config));
                session.phase = SessionPhase::Playing;
            }
            LoadOutcome::NoData(_) => session.show(MessageKind::NoData, None),
            LoadOutcome::Failed(err) => session.show(MessageKind::InvalidFile, Some(err.to_string())),
        }
        session
    }

    /// Load `path` and start a session
    pub fn open(path: &Path, actor: A, config: PlaybackConfig, renderer: R) -> Self {
        Self::from_outcome(load_replay(path), actor, config, renderer)
    }

    /// Open the newest replay in `dir`.
    ///
    /// Recording names embed their start time, so the last one by name is
    /// the newest.
    pub fn open_latest(dir: &Path, actor: A, config: PlaybackConfig, renderer: R) -> Self {
        let files = find_replay_files(dir).unwrap_or_else(|e| {
            tracing::warn!("Cannot list replays in {}: {}", dir.display(), e);
            Vec::new()
        });
        match files.last() {
            Some(path) => Self::open(path, actor, config, renderer),
            None => {
                let mut session = Self::idle(&config, renderer);
                session.show(MessageKind::NoReplayFiles, None);
                session
            }
        }
    }

    /// Run one frame: apply input, advance playback, draw.
    pub fn frame(&mut self, frame_delta: f64, inputs: &[SessionInput]) -> SessionPhase {
        for input in inputs {
            match input {
                SessionInput::Command(command) => {
                    if let Some(engine) = self.engine.as_mut() {
                        engine.handle_command(*command);
                    }
                }
                SessionInput::DismissMessage => {
                    if let Some(message) = self.message.as_mut() {
                        message.dismiss();
                    }
                }
                SessionInput::Exit => {
                    self.engine = None;
                    self.phase = SessionPhase::Exited;
                }
            }
        }

        if let Some(engine) = self.engine.as_mut() {
            engine.update(frame_delta);
        }
        if let Some(message) = self.message.as_mut() {
            message.tick(frame_delta);
        }
        if self.message.as_ref().is_some_and(StatusMessage::is_expired) {
            self.message = None;
        }

        let view = PlaybackView {
            playback: self.engine.as_ref().map(PlaybackStatus::capture),
            particles: self
                .engine
                .as_ref()
                .map(|engine| engine.particles().particles())
                .unwrap_or(&[]),
            message: self.message.as_ref(),
        };
        if let Err(e) = self.renderer.render(&view) {
            self.on_runtime_error(RuntimeError(format!("Render error: {:#}", e)));
        }

        self.phase
    }

    /// Stop playback and surface the failure as a transient message
    pub fn on_runtime_error(&mut self, error: RuntimeError) {
        tracing::error!("Runtime error: {}", error);
        self.engine = None;
        self.phase = SessionPhase::Aborted;
        self.show(MessageKind::RuntimeFailure, Some(error.0));
    }

    fn idle(config: &PlaybackConfig, renderer: R) -> Self {
        Self {
            engine: None,
            renderer,
            message: None,
            message_seconds: config.message_seconds,
            phase: SessionPhase::Aborted,
        }
    }

    fn show(&mut self, kind: MessageKind, detail: Option<String>) {
        let mut message = StatusMessage::new(kind, self.message_seconds);
        message.detail = detail;
        self.message = Some(message);
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn engine(&self) -> Option<&PlaybackEngine<A>> {
        self.engine.as_ref()
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::runtime::loader::read_replay;

    #[derive(Default)]
    struct FakeRenderer {
        frames: Vec<(Option<PlaybackStatus>, Option<MessageKind>)>,
        fail_on_frame: Option<usize>,
    }

    impl ReplayRenderer for FakeRenderer {
        fn render(&mut self, view: &PlaybackView<'_>) -> anyhow::Result<()> {
            if self.fail_on_frame == Some(self.frames.len()) {
                self.fail_on_frame = None;
                anyhow::bail!("device lost");
            }
            self.frames
                .push((view.playback, view.message.map(|message| message.kind)));
            Ok(())
        }
    }

    const LOG: &str = "VERSION: 2\nRECORD_FPS: 64\nC:0.000,D\nS:0.000,100,100,0,0,0,0\nS:1.000,200,100,0,0,0,0\n";

    fn session(text: &str, renderer: FakeRenderer) -> ReplaySession<FakeRenderer> {
        ReplaySession::from_outcome(
            read_replay(text.as_bytes()),
            Player::default(),
            PlaybackConfig::default(),
            renderer,
        )
    }

    #[test]
    fn test_status_message_lifetime() {
        let mut message = StatusMessage::new(MessageKind::NoData, 1.0).with_detail("empty.dem");
        assert_eq!(message.text(), "Replay file has no usable records: empty.dem");

        message.tick(0.4);
        assert!(!message.is_expired());
        assert!((message.remaining() - 0.6).abs() < 1e-12);

        message.tick(5.0);
        assert!(message.is_expired());
        assert_eq!(message.remaining(), 0.0);

        let mut message = StatusMessage::new(MessageKind::InvalidFile, 3.0);
        message.dismiss();
        assert!(message.is_expired());
    }

    #[test]
    fn test_loaded_session_plays_and_renders() {
        let mut session = session(LOG, FakeRenderer::default());
        assert_eq!(session.phase(), SessionPhase::Playing);

        for _ in 0..30 {
            assert_eq!(session.frame(1.0 / 60.0, &[]), SessionPhase::Playing);
        }

        let frames = &session.renderer().frames;
        assert_eq!(frames.len(), 30);
        let last = frames[29].0.unwrap();
        assert!((last.current_time - 0.5).abs() < 1e-9);
        assert_eq!(last.state, PlaybackState::Playing);
        assert!(frames.iter().all(|(_, message)| message.is_none()));
    }

    #[test]
    fn test_commands_reach_engine() {
        let mut session = session(LOG, FakeRenderer::default());
        session.frame(
            0.0,
            &[
                SessionInput::Command(PlaybackCommand::SeekMiddle),
                SessionInput::Command(PlaybackCommand::Pause),
            ],
        );
        let engine = session.engine().unwrap();
        assert_eq!(engine.current_time(), 0.5);
        assert_eq!(engine.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_corrupt_file_shows_invalid_message() {
        let mut session = session("VERSION: 2\nS:abc,1,2,3,4,5\n", FakeRenderer::default());
        assert_eq!(session.phase(), SessionPhase::Aborted);
        assert!(session.engine().is_none());

        let message = session.message().unwrap();
        assert_eq!(message.kind, MessageKind::InvalidFile);
        assert!(message.text().contains("line 2"));

        session.frame(0.1, &[]);
        assert_eq!(session.renderer().frames[0], (None, Some(MessageKind::InvalidFile)));
    }

    #[test]
    fn test_no_data_message_expires() {
        let mut session = session("VERSION: 2\nC:0.0,W\n", FakeRenderer::default());
        assert_eq!(session.message().unwrap().kind, MessageKind::NoData);

        session.frame(2.0, &[]);
        assert!(session.message().is_some());
        session.frame(2.0, &[]);
        assert!(session.message().is_none());
    }

    #[test]
    fn test_dismiss_clears_message() {
        let mut session = session("VERSION: 2\n", FakeRenderer::default());
        session.frame(0.0, &[SessionInput::DismissMessage]);
        assert!(session.message().is_none());
    }

    #[test]
    fn test_render_error_aborts_playback() {
        let renderer = FakeRenderer {
            fail_on_frame: Some(2),
            ..Default::default()
        };
        let mut session = session(LOG, renderer);

        assert_eq!(session.frame(0.1, &[]), SessionPhase::Playing);
        assert_eq!(session.frame(0.1, &[]), SessionPhase::Playing);
        assert_eq!(session.frame(0.1, &[]), SessionPhase::Aborted);

        assert!(session.engine().is_none());
        let message = session.message().unwrap();
        assert_eq!(message.kind, MessageKind::RuntimeFailure);
        assert!(message.text().contains("device lost"));

        // Later frames keep showing the message without playback
        session.frame(0.1, &[]);
        assert_eq!(
            session.renderer().frames.last(),
            Some(&(None, Some(MessageKind::RuntimeFailure)))
        );
    }

    #[test]
    fn test_exit() {
        let mut session = session(LOG, FakeRenderer::default());
        assert_eq!(session.frame(0.1, &[SessionInput::Exit]), SessionPhase::Exited);
        assert!(session.engine().is_none());
    }

    #[test]
    fn test_open_latest() {
        let dir = tempfile::tempdir().unwrap();
        let empty = ReplaySession::<FakeRenderer>::open_latest(
            dir.path(),
            Player::default(),
            PlaybackConfig::default(),
            FakeRenderer::default(),
        );
        assert_eq!(empty.message().unwrap().kind, MessageKind::NoReplayFiles);

        std::fs::write(dir.path().join("game_recording_20240101_000000.dem"), "VERSION: 2\n").unwrap();
        std::fs::write(dir.path().join("game_recording_20240102_000000.dem"), LOG).unwrap();
        let latest = ReplaySession::<FakeRenderer>::open_latest(
            dir.path(),
            Player::default(),
            PlaybackConfig::default(),
            FakeRenderer::default(),
        );
        assert_eq!(latest.phase(), SessionPhase::Playing);
        assert_eq!(latest.engine().unwrap().total_duration(), 1.0);
    }
}
