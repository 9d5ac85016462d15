//! Text demo format reader
//!
//! Reads .dem logs into per-record-type sequences, honoring the declared
//! format version of each data line.

use glam::DVec2;
use std::io::BufRead;

use super::{HeaderKey, LineKind, RecordPrefix, SnapshotSchema};
use crate::replay::error::LoadError;
use crate::replay::types::*;

/// Version bookkeeping threaded through the line loop
#[derive(Debug, Clone, Copy)]
struct ParseState {
    version: u32,
    data_seen: bool,
}

impl Default for ParseState {
    fn default() -> Self {
        Self {
            version: 1,
            data_seen: false,
        }
    }
}

/// Reader for the text demo format
pub struct TextReader<R: BufRead> {
    reader: R,
}

impl<R: BufRead> TextReader<R> {
    /// Create a new text reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read a complete log from the input.
    ///
    /// Any malformed numeric field aborts the read; nothing partial is
    /// returned.
    pub fn read_log(&mut self) -> Result<ReplayLog, LoadError> {
        let mut state = ParseState::default();
        let mut log = ReplayLog::default();

        for (index, line) in (&mut self.reader).lines().enumerate() {
            let line = line?;
            let line_no = index + 1;

            match LineKind::classify(&line) {
                LineKind::Header(key, value) => {
                    read_header(&mut log.header, &mut state, key, value, line_no)?
                }
                LineKind::Data(data) => {
                    state.data_seen = true;
                    if state.version >= 2 {
                        read_prefixed(&mut log, data, line_no)?;
                    } else if let Some(snapshot) = read_snapshot_fields(
                        data.split(',').collect(),
                        SnapshotSchema::for_version(state.version),
                        line_no,
                    )? {
                        log.snapshots.push(snapshot);
                    }
                }
                LineKind::Ignored => {}
            }
        }

        log.header.format_version = state.version;
        ensure_sorted(&mut log.commands, "command");
        ensure_sorted(&mut log.inputs, "input");
        ensure_sorted(&mut log.snapshots, "snapshot");

        Ok(log)
    }
}

fn read_header(
    header: &mut LogHeader,
    state: &mut ParseState,
    key: HeaderKey,
    value: &str,
    line_no: usize,
) -> Result<(), LoadError> {
    match key {
        HeaderKey::Version => {
            let version: u32 = parse_number(value, "VERSION", line_no)?;
            if state.data_seen {
                log::warn!(
                    "line {}: ignoring VERSION {} declared after data lines (keeping {})",
                    line_no,
                    version,
                    state.version
                );
            } else {
                state.version = version;
            }
        }
        HeaderKey::RecordFps => {
            header.record_fps = Some(parse_number(value, "RECORD_FPS", line_no)?);
        }
        HeaderKey::StartTime => {
            header.start_time_epoch = Some(parse_number(value, "START_TIME", line_no)?);
        }
        HeaderKey::ScreenWidth => header.screen_width = parse_dimension(value, key, line_no),
        HeaderKey::ScreenHeight => header.screen_height = parse_dimension(value, key, line_no),
    }
    Ok(())
}

/// Screen size is informational only, so a bad value is dropped rather than fatal
fn parse_dimension(value: &str, key: HeaderKey, line_no: usize) -> Option<u32> {
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("line {}: ignoring {} value {:?}", line_no, key.name(), value);
            None
        }
    }
}

fn read_prefixed(log: &mut ReplayLog, data: &str, line_no: usize) -> Result<(), LoadError> {
    let Some((tag, body)) = data.split_once(':') else {
        return Err(LoadError::parse(line_no, "data line has no record prefix"));
    };
    let Some(prefix) = RecordPrefix::from_tag(tag) else {
        log::debug!("line {}: skipping unknown record prefix {:?}", line_no, tag);
        return Ok(());
    };

    let body = body.trim();
    let (time_field, rest) = match body.split_once(',') {
        Some((time, rest)) => (time, rest),
        None => (body, ""),
    };

    match prefix {
        RecordPrefix::Command => {
            log.commands.push(CommandRecord {
                timestamp: parse_timestamp(time_field, line_no)?,
                keys_held: parse_key_list(rest, line_no),
            });
        }
        RecordPrefix::Input => {
            log.inputs.push(InputDeltaRecord {
                timestamp: parse_timestamp(time_field, line_no)?,
                changes: parse_changes(rest, line_no)?,
            });
        }
        RecordPrefix::Snapshot => {
            if let Some(snapshot) = read_snapshot_fields(
                body.split(',').collect(),
                SnapshotSchema::for_version(2),
                line_no,
            )? {
                log.snapshots.push(snapshot);
            }
        }
    }
    Ok(())
}

fn parse_key_list(list: &str, line_no: usize) -> KeySet {
    let mut keys = KeySet::empty();
    for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match KeySet::from_token(token) {
            Some(flag) => keys |= flag,
            None => log::warn!("line {}: unknown command key {:?}", line_no, token),
        }
    }
    keys
}

fn parse_changes(list: &str, line_no: usize) -> Result<Vec<InputChange>, LoadError> {
    let mut changes = Vec::new();
    for token in list.split(';').map(str::trim) {
        let Some((key, flag)) = token.split_once(':') else {
            continue;
        };
        changes.push(InputChange {
            key: InputKey::parse(key),
            down: parse_flag(flag, line_no)?,
        });
    }
    Ok(changes)
}

fn read_snapshot_fields(
    fields: Vec<&str>,
    schema: SnapshotSchema,
    line_no: usize,
) -> Result<Option<StateSnapshot>, LoadError> {
    if fields.len() < schema.required_fields {
        log::debug!(
            "line {}: skipping snapshot with {} fields",
            line_no,
            fields.len()
        );
        return Ok(None);
    }

    let number = |i: usize| parse_number::<f64>(fields[i].trim(), "snapshot field", line_no);
    let adrenaline_active = schema.adrenaline_field
        && fields
            .get(6)
            .map(|raw| {
                parse_flag(raw, line_no).unwrap_or_else(|_| {
                    log::warn!("line {}: unreadable adrenaline flag {:?}", line_no, raw);
                    false
                })
            })
            .unwrap_or(false);

    Ok(Some(StateSnapshot {
        timestamp: parse_timestamp(fields[0], line_no)?,
        position: DVec2::new(number(1)?, number(2)?),
        velocity: DVec2::new(number(3)?, number(4)?),
        sprinting: parse_flag(fields[5], line_no)?,
        adrenaline_active,
    }))
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &str, line_no: usize) -> Result<T, LoadError> {
    raw.trim()
        .parse()
        .map_err(|_| LoadError::parse(line_no, format!("invalid {}: {:?}", what, raw)))
}

fn parse_timestamp(raw: &str, line_no: usize) -> Result<f64, LoadError> {
    let value: f64 = parse_number(raw, "timestamp", line_no)?;
    if !value.is_finite() {
        return Err(LoadError::parse(line_no, format!("non-finite timestamp {:?}", raw)));
    }
    Ok(value)
}

/// Integer flag, any non-zero value is true
fn parse_flag(raw: &str, line_no: usize) -> Result<bool, LoadError> {
    parse_number::<i64>(raw, "flag", line_no).map(|v| v != 0)
}

fn ensure_sorted<T: Timed>(records: &mut [T], kind: &str) {
    let sorted = records
        .windows(2)
        .all(|pair| pair[0].timestamp() <= pair[1].timestamp());
    if !sorted {
        log::warn!("{} records out of order, sorting by timestamp", kind);
        records.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
    }
}
