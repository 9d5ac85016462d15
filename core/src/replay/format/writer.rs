//! Text demo format writer
//!
//! Writes .dem logs byte-compatible with older readers: 3-decimal
//! timestamps and positions, integer flags.

use std::io::{self, Write};

use super::{CURRENT_FORMAT_VERSION, HeaderKey, RecordPrefix, format_epoch};
use crate::replay::types::*;

/// Writer for the text demo format
pub struct TextWriter<W: Write> {
    writer: W,
    version: u32,
}

impl<W: Write> TextWriter<W> {
    /// Create a new text writer for the current format version
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            version: CURRENT_FORMAT_VERSION,
        }
    }

    /// Format version data lines are written in
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Write a complete log: header, then all records merged by timestamp
    pub fn write_log(&mut self, log: &ReplayLog) -> io::Result<()> {
        self.write_header(&log.header)?;

        let (mut c, mut i, mut s) = (0, 0, 0);
        loop {
            let next = [
                log.commands.get(c).map(Timed::timestamp),
                log.inputs.get(i).map(Timed::timestamp),
                log.snapshots.get(s).map(Timed::timestamp),
            ];
            let Some(pick) = next
                .iter()
                .enumerate()
                .filter_map(|(idx, t)| t.map(|t| (idx, t)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(idx, _)| idx)
            else {
                break;
            };

            match pick {
                0 => {
                    self.write_command(&log.commands[c])?;
                    c += 1;
                }
                1 => {
                    self.write_input(&log.inputs[i])?;
                    i += 1;
                }
                _ => {
                    self.write_snapshot(&log.snapshots[s])?;
                    s += 1;
                }
            }
        }

        Ok(())
    }

    /// Write the header block. Fields that are `None` are left out.
    ///
    /// The header's version decides the shape of every following data line.
    pub fn write_header(&mut self, header: &LogHeader) -> io::Result<()> {
        self.version = header.format_version;
        for key in HeaderKey::ALL {
            let value = match key {
                HeaderKey::Version => Some(header.format_version.to_string()),
                HeaderKey::ScreenWidth => header.screen_width.map(|v| v.to_string()),
                HeaderKey::ScreenHeight => header.screen_height.map(|v| v.to_string()),
                HeaderKey::RecordFps => header.record_fps.map(|v| v.to_string()),
                HeaderKey::StartTime => header.start_time_epoch.map(format_epoch),
            };
            if let Some(value) = value {
                writeln!(self.writer, "{}: {}", key.name(), value)?;
            }
        }
        Ok(())
    }

    /// `C:time,W,S,A,D,SHIFT`
    pub fn write_command(&mut self, record: &CommandRecord) -> io::Result<()> {
        self.require_prefixed("command")?;
        writeln!(
            self.writer,
            "{}:{:.3},{}",
            RecordPrefix::Command.tag(),
            record.timestamp,
            record.keys_held.to_token_list()
        )
    }

    /// `I:time,KEY:0|1;KEY:0|1`
    pub fn write_input(&mut self, record: &InputDeltaRecord) -> io::Result<()> {
        self.require_prefixed("input")?;
        let changes = record
            .changes
            .iter()
            .map(|change| format!("{}:{}", change.key.token(), u8::from(change.down)))
            .collect::<Vec<_>>()
            .join(";");
        writeln!(
            self.writer,
            "{}:{:.3},{}",
            RecordPrefix::Input.tag(),
            record.timestamp,
            changes
        )
    }

    /// `S:time,x,y,vx,vy,sprinting,adrenaline` (bare six fields in version 1)
    pub fn write_snapshot(&mut self, snapshot: &StateSnapshot) -> io::Result<()> {
        let fields = format!(
            "{:.3},{:.3},{:.3},{:.3},{:.3},{}",
            snapshot.timestamp,
            snapshot.position.x,
            snapshot.position.y,
            snapshot.velocity.x,
            snapshot.velocity.y,
            u8::from(snapshot.sprinting)
        );
        if self.version >= 2 {
            writeln!(
                self.writer,
                "{}:{},{}",
                RecordPrefix::Snapshot.tag(),
                fields,
                u8::from(snapshot.adrenaline_active)
            )
        } else {
            writeln!(self.writer, "{}", fields)
        }
    }

    /// Flush buffered output
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn require_prefixed(&self, kind: &str) -> io::Result<()> {
        if self.version >= 2 {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("format version {} cannot hold {} records", self.version, kind),
            ))
        }
    }
}
