//! Integration tests for the record/replay pipeline
//!
//! Tests a live recording read back from disk, legacy version 1 logs,
//! and how sessions surface broken or missing files.

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use crate::actor::{Actor, Key, Player, SimulatedKeys};
    use crate::config::{PlaybackConfig, RecordingConfig};
    use crate::replay::runtime::{
        LoadOutcome, MessageKind, PlaybackEngine, PlaybackView, Recorder, ReplayRenderer,
        ReplaySession, SessionInput, SessionPhase, find_replay_files, load_replay,
    };
    use crate::replay::{LoadError, PlaybackCommand, Timed};

    /// Renderer that only counts frames
    #[derive(Default)]
    struct CountingRenderer {
        frames: usize,
        with_playback: usize,
    }

    impl ReplayRenderer for CountingRenderer {
        fn render(&mut self, view: &PlaybackView<'_>) -> anyhow::Result<()> {
            self.frames += 1;
            if view.playback.is_some() {
                self.with_playback += 1;
            }
            Ok(())
        }
    }

    /// Record one second of play: D held for 40 frames, then released
    fn record_session(dir: &std::path::Path) -> std::path::PathBuf {
        let (path, mut recorder) =
            Recorder::create_in_dir(dir, &RecordingConfig::default()).unwrap();
        let mut player = Player::default();
        let mut keys = SimulatedKeys::new();

        for frame in 1..=60u32 {
            keys.set(Key::D, frame <= 40);
            player.update(&keys, 1.0 / 60.0);
            recorder
                .record_frame(&player, &keys, frame as f64 / 60.0)
                .unwrap();
        }
        assert_eq!(recorder.frame_count(), 60);
        recorder.stop().unwrap();
        path
    }

    // ============================================================================
    // Record -> load -> play
    // ============================================================================

    #[test]
    fn test_recorded_session_loads_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = record_session(dir.path());

        assert_eq!(find_replay_files(dir.path()).unwrap(), vec![path.clone()]);

        let log = load_replay(&path).into_result().unwrap();
        assert_eq!(log.header.format_version, 2);
        assert_eq!(log.header.record_fps, Some(64));
        assert_eq!(log.header.screen_width, Some(1920));
        assert_eq!(log.commands.len(), 60);
        assert_eq!(log.inputs.len(), 2);
        assert!(log.snapshots.len() >= 4);

        let sorted = |times: Vec<f64>| times.windows(2).all(|w| w[0] <= w[1]);
        assert!(sorted(log.commands.iter().map(Timed::timestamp).collect()));
        assert!(sorted(log.inputs.iter().map(Timed::timestamp).collect()));
        assert!(sorted(log.snapshots.iter().map(Timed::timestamp).collect()));
        assert!((log.total_duration() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_play_recorded_session_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = record_session(dir.path());
        let log = load_replay(&path).into_result().unwrap();
        let start_x = log.snapshots[0].position.x;
        let last = *log.snapshots.last().unwrap();

        let mut engine = PlaybackEngine::new(log, Player::default(), PlaybackConfig::default());
        engine.handle_command(PlaybackCommand::FastForward);
        for _ in 0..60 {
            engine.update(1.0 / 60.0);
        }

        assert_eq!(engine.current_time(), engine.total_duration());
        assert_eq!(engine.cursor().command, 60);
        assert_eq!(engine.cursor().input, 2);
        assert!(!engine.keys().is_down(Key::D));
        assert!(engine.actor().position().x > start_x);

        engine.seek(engine.total_duration());
        assert_eq!(engine.actor().position(), last.position);
        assert_eq!(engine.actor().velocity(), last.velocity);
    }

    #[test]
    fn test_rewind_recorded_session_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = record_session(dir.path());
        let log = load_replay(&path).into_result().unwrap();

        let mut engine = PlaybackEngine::new(log, Player::default(), PlaybackConfig::default());
        engine.seek(engine.total_duration());
        engine.handle_command(PlaybackCommand::Rewind);
        for _ in 0..60 {
            engine.update(1.0 / 60.0);
            assert!(engine.current_time() >= 0.0);
        }

        assert_eq!(engine.current_time(), 0.0);
        assert_eq!(engine.cursor().command, 0);
        assert_eq!(engine.stall_recoveries(), 0);
    }

    // ============================================================================
    // Legacy logs
    // ============================================================================

    #[test]
    fn test_version_one_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.dem");
        std::fs::write(
            &path,
            "SCREEN_WIDTH: 800\nSCREEN_HEIGHT: 600\n0.0,10,10,0,0,0\n0.5,20,10,20,0,1\n",
        )
        .unwrap();

        let log = load_replay(&path).into_result().unwrap();
        assert_eq!(log.header.format_version, 1);
        assert!(log.commands.is_empty());
        assert!(log.inputs.is_empty());
        assert_eq!(log.snapshots.len(), 2);

        let mut engine = PlaybackEngine::new(log, Player::default(), PlaybackConfig::default());
        assert_eq!(engine.command_step(), 1.0 / 8.0);
        assert_eq!(engine.actor().position(), DVec2::new(10.0, 10.0));

        engine.update(0.25);
        assert_eq!(engine.blend(), Some(0.5));
        assert!((engine.actor().position().x - 11.5).abs() < 1e-9);
        assert!(engine.actor().is_sprinting());
    }

    // ============================================================================
    // Sessions over broken input
    // ============================================================================

    #[test]
    fn test_malformed_file_yields_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.dem");
        std::fs::write(&path, "VERSION: 2\nS:0.000,abc,1,0,0,0,0\n").unwrap();

        let outcome = load_replay(&path);
        assert!(matches!(
            outcome,
            LoadOutcome::Failed(LoadError::Parse { line: 2, .. })
        ));
        assert!(outcome.into_log().is_empty());

        let mut session = ReplaySession::open(
            &path,
            Player::default(),
            PlaybackConfig::default(),
            CountingRenderer::default(),
        );
        assert_eq!(session.phase(), SessionPhase::Aborted);
        assert_eq!(session.message().unwrap().kind, MessageKind::InvalidFile);

        session.frame(1.0 / 60.0, &[]);
        assert_eq!(session.renderer().frames, 1);
        assert_eq!(session.renderer().with_playback, 0);
    }

    #[test]
    fn test_session_plays_latest_recording() {
        let dir = tempfile::tempdir().unwrap();
        let empty = ReplaySession::open_latest(
            dir.path(),
            Player::default(),
            PlaybackConfig::default(),
            CountingRenderer::default(),
        );
        assert_eq!(empty.message().unwrap().kind, MessageKind::NoReplayFiles);

        record_session(dir.path());
        let mut session = ReplaySession::open_latest(
            dir.path(),
            Player::default(),
            PlaybackConfig::default(),
            CountingRenderer::default(),
        );
        assert_eq!(session.phase(), SessionPhase::Playing);

        for _ in 0..30 {
            session.frame(1.0 / 60.0, &[]);
        }
        let time = session.engine().unwrap().current_time();
        assert!((time - 0.5).abs() < 1e-9);

        assert_eq!(session.frame(1.0 / 60.0, &[SessionInput::Exit]), SessionPhase::Exited);
        assert!(session.engine().is_none());
        assert_eq!(session.renderer().with_playback, 30);
    }
}
