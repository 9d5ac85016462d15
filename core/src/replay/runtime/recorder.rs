//! Replay recorder
//!
//! Samples the live actor and keyboard once per frame and streams text
//! log records to disk.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};

use crate::actor::{Actor, SimulatedKeys};
use crate::config::RecordingConfig;
use crate::replay::format::{FILE_EXTENSION, TextWriter};
use crate::replay::types::{
    CommandRecord, InputChange, InputDeltaRecord, InputKey, KeySet, LogHeader, StateSnapshot,
};

/// File name for a recording started at `when`
pub fn recording_file_name(when: DateTime<Local>) -> String {
    format!(
        "game_recording_{}.{}",
        when.format("%Y%m%d_%H%M%S"),
        FILE_EXTENSION
    )
}

/// Replay recorder state
pub struct Recorder<W: Write> {
    writer: Option<TextWriter<W>>,
    record_fps: u32,
    snapshot_interval: f64,
    /// Last emitted down-state per [`InputKey::MONITORED`] key
    last_keys: [bool; InputKey::MONITORED.len()],
    last_command_time: f64,
    last_snapshot_time: f64,
    frame_count: u64,
}

impl Recorder<BufWriter<File>> {
    /// Create `path` and start recording into it
    pub fn create(path: &Path, config: &RecordingConfig) -> io::Result<Self> {
        let file = File::create(path)?;
        tracing::info!("Recording to {}", path.display());
        Self::start(BufWriter::new(file), config, now_epoch())
    }

    /// Start recording into a timestamped file inside `dir`
    pub fn create_in_dir(dir: &Path, config: &RecordingConfig) -> io::Result<(PathBuf, Self)> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(recording_file_name(Local::now()));
        let recorder = Self::create(&path, config)?;
        Ok((path, recorder))
    }
}

impl<W: Write> Recorder<W> {
    /// Write the header block and start recording
    pub fn start(writer: W, config: &RecordingConfig, start_time_epoch: f64) -> io::Result<Self> {
        let mut writer = TextWriter::new(writer);
        writer.write_header(&LogHeader {
            format_version: config.format_version,
            screen_width: Some(config.screen_width),
            screen_height: Some(config.screen_height),
            record_fps: Some(config.record_fps),
            start_time_epoch: Some(start_time_epoch),
        })?;

        Ok(Self {
            writer: Some(writer),
            record_fps: config.record_fps.max(1),
            snapshot_interval: config.snapshot_interval,
            last_keys: [false; InputKey::MONITORED.len()],
            last_command_time: 0.0,
            last_snapshot_time: 0.0,
            frame_count: 0,
        })
    }

    /// Check if recording is active
    pub fn is_recording(&self) -> bool {
        self.writer.is_some()
    }

    /// Number of frames sampled so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Sample one frame.
    ///
    /// `elapsed` is seconds since the recording started. Commands follow the
    /// `RECORD_FPS` cadence, snapshots the snapshot interval, and input deltas
    /// are written whenever a monitored key changed since the last delta.
    pub fn record_frame<A: Actor>(
        &mut self,
        actor: &A,
        keys: &SimulatedKeys,
        elapsed: f64,
    ) -> io::Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        self.frame_count += 1;
        let prefixed = writer.version() >= 2;

        if prefixed && elapsed - self.last_command_time >= 1.0 / self.record_fps as f64 {
            writer.write_command(&CommandRecord {
                timestamp: elapsed,
                keys_held: KeySet::from_keys(keys),
            })?;
            self.last_command_time = elapsed;
        }

        if prefixed {
            let mut changes = Vec::new();
            for (key, last) in InputKey::MONITORED.iter().zip(self.last_keys.iter_mut()) {
                let down = key.read(keys).unwrap_or(false);
                if down != *last {
                    changes.push(InputChange {
                        key: key.clone(),
                        down,
                    });
                    *last = down;
                }
            }
            if !changes.is_empty() {
                writer.write_input(&InputDeltaRecord {
                    timestamp: elapsed,
                    changes,
                })?;
            }
        }

        if elapsed - self.last_snapshot_time >= self.snapshot_interval {
            writer.write_snapshot(&StateSnapshot {
                timestamp: elapsed,
                position: actor.position(),
                velocity: actor.velocity(),
                sprinting: actor.is_sprinting(),
                adrenaline_active: actor.adrenaline_active(),
            })?;
            self.last_snapshot_time = elapsed;
        }

        Ok(())
    }

    /// Flush and close the log, returning the underlying writer.
    ///
    /// Only the first call does anything; later calls return `Ok(None)`.
    pub fn stop(&mut self) -> io::Result<Option<W>> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(None);
        };
        writer.flush()?;
        tracing::info!("Recording stopped after {} frames", self.frame_count);
        Ok(Some(writer.into_inner()))
    }
}

fn now_epoch() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
