use super::*;
use crate::replay::types::{CommandRecord, InputDeltaRecord, LogHeader};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Actor that records every physics step it is asked to take
#[derive(Debug, Default)]
struct StepLog {
    position: DVec2,
    velocity: DVec2,
    sprinting: bool,
    adrenaline: bool,
    steps: Vec<(KeySet, f64)>,
}

impl Actor for StepLog {
    fn position(&self) -> DVec2 {
        self.position
    }

    fn velocity(&self) -> DVec2 {
        self.velocity
    }

    fn is_sprinting(&self) -> bool {
        self.sprinting
    }

    fn adrenaline_active(&self) -> bool {
        self.adrenaline
    }

    fn set_position(&mut self, position: DVec2) {
        self.position = position;
    }

    fn set_velocity(&mut self, velocity: DVec2) {
        self.velocity = velocity;
    }

    fn set_sprinting(&mut self, sprinting: bool) {
        self.sprinting = sprinting;
    }

    fn set_adrenaline_active(&mut self, active: bool) {
        self.adrenaline = active;
    }

    fn update(&mut self, keys: &SimulatedKeys, dt: f64) {
        self.steps.push((KeySet::from_keys(keys), dt));
    }
}

fn snapshot(timestamp: f64, x: f64) -> StateSnapshot {
    StateSnapshot {
        timestamp,
        position: DVec2::new(x, 0.0),
        velocity: DVec2::ZERO,
        sprinting: false,
        adrenaline_active: false,
    }
}

fn command(timestamp: f64, keys_held: KeySet) -> CommandRecord {
    CommandRecord {
        timestamp,
        keys_held,
    }
}

fn v2_log(snapshots: Vec<StateSnapshot>, commands: Vec<CommandRecord>) -> ReplayLog {
    ReplayLog {
        header: LogHeader {
            format_version: 2,
            record_fps: Some(64),
            ..Default::default()
        },
        commands,
        inputs: Vec::new(),
        snapshots,
    }
}

fn engine(log: ReplayLog) -> PlaybackEngine<StepLog> {
    PlaybackEngine::new(log, StepLog::default(), PlaybackConfig::default())
}

/// Snapshots every 0.5s and commands every 0.25s up to 6s
fn long_log() -> ReplayLog {
    let snapshots = (0..=12).map(|i| snapshot(i as f64 * 0.5, i as f64 * 10.0)).collect();
    let commands = (0..=24)
        .map(|i| command(i as f64 * 0.25, KeySet::RIGHT))
        .collect();
    v2_log(snapshots, commands)
}

#[test]
fn test_seek_midway_targets_interpolated_position() {
    let mut engine = engine(v2_log(vec![snapshot(0.0, 0.0), snapshot(1.0, 100.0)], vec![]));

    engine.seek(0.5);

    let target = engine.interpolation_target().unwrap();
    assert_eq!(target.position.x, 50.0);
    assert_eq!(target.blend, 0.5);
    assert_eq!(engine.actor().position().x, 50.0);
}

#[test]
fn test_interpolation_is_exact_at_endpoints() {
    let a = StateSnapshot {
        timestamp: 1.0,
        position: DVec2::new(0.1, 17.3),
        velocity: DVec2::new(-3.7, 0.3),
        sprinting: true,
        adrenaline_active: false,
    };
    let b = StateSnapshot {
        timestamp: 2.0,
        position: DVec2::new(0.3, -4.9),
        velocity: DVec2::new(12.1, 0.7),
        sprinting: false,
        adrenaline_active: false,
    };
    let mut engine = engine(v2_log(vec![a, b], vec![]));

    engine.seek(1.0);
    let at_prev = *engine.interpolation_target().unwrap();
    assert_eq!(at_prev.blend, 0.0);
    assert_eq!(at_prev.position, a.position);
    assert_eq!(at_prev.velocity, a.velocity);
    assert!(at_prev.sprinting);

    engine.seek(2.0);
    let at_next = *engine.interpolation_target().unwrap();
    assert_eq!(at_next.blend, 1.0);
    assert_eq!(at_next.position, b.position);
    assert_eq!(at_next.velocity, b.velocity);
    assert!(!at_next.sprinting);
}

#[test]
fn test_update_smooths_toward_target() {
    let mut engine = engine(v2_log(vec![snapshot(0.0, 0.0), snapshot(1.0, 100.0)], vec![]));
    assert_eq!(engine.actor().position().x, 0.0);

    engine.update(0.5);

    assert_eq!(engine.current_time(), 0.5);
    assert_eq!(engine.interpolation_target().unwrap().position.x, 50.0);
    assert!((engine.actor().position().x - 15.0).abs() < 1e-9);
}

#[test]
fn test_current_time_stays_clamped() {
    let mut engine = engine(long_log());
    let mut rng = Pcg32::seed_from_u64(11);
    let commands = [
        PlaybackCommand::Play,
        PlaybackCommand::Rewind,
        PlaybackCommand::FastForward,
        PlaybackCommand::TogglePause,
        PlaybackCommand::SpeedUp,
        PlaybackCommand::SpeedDown,
    ];

    for _ in 0..2000 {
        if rng.random_range(0..4) == 0 {
            engine.handle_command(commands[rng.random_range(0..commands.len())]);
        }
        engine.update(rng.random_range(0.0..0.5));
        let t = engine.current_time();
        assert!((0.0..=engine.total_duration()).contains(&t), "t = {t}");
    }

    engine.handle_command(PlaybackCommand::Seek(-3.0));
    assert_eq!(engine.current_time(), 0.0);
    engine.handle_command(PlaybackCommand::Seek(100.0));
    assert_eq!(engine.current_time(), 6.0);
}

#[test]
fn test_rewind_stall_forces_resync() {
    let mut engine = engine(long_log());
    engine.seek(5.0);
    engine.handle_command(PlaybackCommand::Rewind);

    engine.update(0.0);
    engine.update(0.0);

    assert_eq!(engine.stall_recoveries(), 2);
    assert_eq!(engine.current_time(), 5.0);
    assert_eq!(
        engine.cursor(),
        PlaybackCursor {
            command: 20,
            input: 0,
            snapshot: 10,
        }
    );

    engine.update(0.1);
    assert_eq!(engine.stall_recoveries(), 2);
    assert!((engine.current_time() - 4.8).abs() < 1e-12);
    assert_eq!(engine.cursor().command, 19);
    assert_eq!(engine.cursor().snapshot, 9);
}

#[test]
fn test_no_stall_at_time_zero() {
    let mut engine = engine(long_log());
    engine.handle_command(PlaybackCommand::Rewind);
    engine.update(0.0);
    assert_eq!(engine.stall_recoveries(), 0);
    assert_eq!(engine.current_time(), 0.0);
}

#[test]
fn test_commands_applied_once_in_order() {
    let commands: Vec<CommandRecord> = (1..=10)
        .map(|i| {
            let keys = if i % 2 == 0 {
                KeySet::RIGHT
            } else {
                KeySet::FORWARD | KeySet::SPRINT
            };
            command(i as f64 * 0.1, keys)
        })
        .collect();
    let expected: Vec<(KeySet, f64)> = commands
        .iter()
        .map(|c| (c.keys_held, 1.0 / 64.0))
        .collect();
    let mut engine = engine(v2_log(vec![], commands));

    for _ in 0..180 {
        engine.update(1.0 / 60.0);
    }

    assert_eq!(engine.current_time(), 1.0);
    assert_eq!(engine.actor().steps, expected);
    assert_eq!(engine.cursor().command, 10);
}

#[test]
fn test_large_tick_applies_every_due_command() {
    let commands = (0..8).map(|i| command(i as f64 * 0.125, KeySet::LEFT)).collect();
    let mut engine = engine(v2_log(vec![], commands));

    engine.update(0.5);
    assert_eq!(engine.actor().steps.len(), 5);

    engine.update(5.0);
    assert_eq!(engine.actor().steps.len(), 8);
}

#[test]
fn test_empty_command_releases_keys_and_steps() {
    let log = v2_log(
        vec![],
        vec![command(0.0, KeySet::BACK), command(0.5, KeySet::empty())],
    );
    let mut engine = engine(log);

    engine.update(0.25);
    assert!(engine.keys().is_down(Key::S));

    engine.update(0.5);
    assert_eq!(*engine.keys(), SimulatedKeys::new());
    assert_eq!(engine.actor().steps.len(), 2);
    assert_eq!(engine.actor().steps[1].0, KeySet::empty());
}

#[test]
fn test_paused_tick_changes_nothing() {
    let mut engine = engine(long_log());
    engine.update(1.0);
    engine.handle_command(PlaybackCommand::TogglePause);
    assert_eq!(engine.state(), PlaybackState::Paused);

    let before = (engine.current_time(), engine.cursor(), engine.actor().position);
    engine.update(1.0);
    assert_eq!(
        (engine.current_time(), engine.cursor(), engine.actor().position),
        before
    );

    engine.handle_command(PlaybackCommand::TogglePause);
    assert_eq!(engine.state(), PlaybackState::Playing);
}

#[test]
fn test_direction_factors() {
    let mut engine = engine(long_log());
    engine.update(0.5);
    assert_eq!(engine.current_time(), 0.5);

    engine.handle_command(PlaybackCommand::FastForward);
    engine.update(0.5);
    assert_eq!(engine.current_time(), 1.5);

    engine.handle_command(PlaybackCommand::Rewind);
    engine.update(0.25);
    assert_eq!(engine.current_time(), 1.0);
}

#[test]
fn test_rewind_resyncs_cursors_and_skips_commands() {
    let mut engine = engine(long_log());
    engine.seek(4.0);
    let steps_before = engine.actor().steps.len();

    engine.handle_command(PlaybackCommand::Rewind);
    engine.update(0.5);

    assert_eq!(engine.current_time(), 3.0);
    assert_eq!(engine.cursor().command, 12);
    assert_eq!(engine.cursor().snapshot, 6);
    assert_eq!(engine.actor().steps.len(), steps_before);
}

#[test]
fn test_speed_controls_clamp() {
    let mut engine = engine(long_log());
    assert_eq!(engine.speed(), 1.0);

    engine.handle_command(PlaybackCommand::SpeedUp);
    assert_eq!(engine.speed(), 1.5);

    engine.handle_command(PlaybackCommand::SetSpeed(42.0));
    assert_eq!(engine.speed(), 5.0);

    engine.handle_command(PlaybackCommand::SetSpeed(1.0));
    engine.handle_command(PlaybackCommand::SpeedDown);
    engine.handle_command(PlaybackCommand::SpeedDown);
    assert_eq!(engine.speed(), 0.1);

    engine.handle_command(PlaybackCommand::SetSpeed(f64::NAN));
    assert_eq!(engine.speed(), 0.1);
}

#[test]
fn test_seek_shortcuts() {
    let mut engine = engine(long_log());
    engine.handle_command(PlaybackCommand::SeekMiddle);
    assert_eq!(engine.current_time(), 3.0);
    assert_eq!(engine.progress(), 0.5);

    engine.handle_command(PlaybackCommand::SeekBy(-1.0));
    assert_eq!(engine.current_time(), 2.0);
    assert_eq!(engine.cursor().command, 8);

    engine.handle_command(PlaybackCommand::SeekBy(60.0));
    assert_eq!(engine.current_time(), 6.0);
    assert_eq!(engine.progress(), 1.0);
}

#[test]
fn test_adrenaline_rising_edge_bursts_particles() {
    let mut on = snapshot(1.0, 10.0);
    on.adrenaline_active = true;
    let mut engine = engine(v2_log(vec![snapshot(0.0, 0.0), on], vec![]));

    engine.update(0.3);
    assert!(!engine.adrenaline_active());
    assert!(engine.particles().is_empty());

    engine.update(0.3);
    assert!(engine.adrenaline_active());
    assert!(engine.actor().adrenaline);
    assert_eq!(engine.particles().particles().len(), 20);
}

#[test]
fn test_input_deltas_rebuild_keys() {
    let mut log = v2_log(vec![], vec![]);
    log.inputs = vec![
        InputDeltaRecord {
            timestamp: 0.1,
            changes: vec![
                InputChange {
                    key: InputKey::W,
                    down: true,
                },
                InputChange {
                    key: InputKey::Other("Q".to_string()),
                    down: true,
                },
                InputChange {
                    key: InputKey::Shift,
                    down: true,
                },
            ],
        },
        InputDeltaRecord {
            timestamp: 0.3,
            changes: vec![InputChange {
                key: InputKey::W,
                down: false,
            }],
        },
    ];
    let mut engine = engine(log);

    engine.update(0.2);
    assert!(engine.keys().is_down(Key::W));
    assert!(engine.keys().is_down(Key::LeftShift));
    assert!(engine.keys().is_down(Key::RightShift));
    assert_eq!(engine.cursor().input, 1);

    engine.update(0.2);
    assert!(!engine.keys().is_down(Key::W));
    assert_eq!(engine.cursor().input, 2);
}

#[test]
fn test_command_step_follows_header() {
    let mut log = v2_log(vec![], vec![]);
    log.header.record_fps = Some(32);
    assert_eq!(engine(log.clone()).command_step(), 1.0 / 32.0);

    log.header.record_fps = None;
    assert_eq!(engine(log.clone()).command_step(), 1.0 / 64.0);

    log.header.format_version = 1;
    assert_eq!(engine(log).command_step(), 1.0 / 8.0);
}

#[test]
fn test_empty_log_is_inert() {
    let mut engine = engine(ReplayLog::default());
    engine.update(1.0);
    engine.handle_command(PlaybackCommand::SeekMiddle);

    assert_eq!(engine.total_duration(), 0.0);
    assert_eq!(engine.current_time(), 0.0);
    assert_eq!(engine.progress(), 0.0);
    assert!(engine.interpolation_target().is_none());
    assert!(engine.last_snapshot().is_none());
}

#[test]
fn test_drives_player_physics() {
    let log = long_log();
    let mut engine = PlaybackEngine::new(log, Player::default(), PlaybackConfig::default());
    engine.update(0.3);
    assert!(engine.actor().velocity.x > 0.0);
    assert_eq!(engine.last_snapshot().unwrap().timestamp, 0.0);
    assert_eq!(engine.next_snapshot().unwrap().timestamp, 0.5);
}
