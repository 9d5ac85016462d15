//! Text demo format (.dem)
//!
//! Line-oriented, newline-delimited text. A header block of `KEY: value`
//! lines is followed by data lines whose shape depends on the declared
//! format version.
//!
//! # File Structure
//!
//! ```text
//! VERSION: 2
//! SCREEN_WIDTH: 1920
//! SCREEN_HEIGHT: 1080
//! RECORD_FPS: 64
//! START_TIME: 1712345678.25
//! C:0.016,W,SHIFT                          command (keys held)
//! I:0.016,W:1;SHIFT:1                      input delta (key transitions)
//! S:0.200,961.250,540.000,80.000,0.000,1,0 snapshot (pos, vel, sprint, adrenaline)
//! ```
//!
//! Version 1 files have no prefixes: every comma-containing line is a bare
//! six-field snapshot `time,posX,posY,velX,velY,sprinting`.
//!
//! Unrecognized lines are skipped. A malformed number in a recognized line
//! fails the whole load.

mod reader;
mod writer;

pub use reader::TextReader;
pub use writer::TextWriter;

/// Format version written by this build
pub const CURRENT_FORMAT_VERSION: u32 = 2;

/// Command cadence assumed for version 2+ logs without `RECORD_FPS`
pub const DEFAULT_RECORD_FPS: u32 = 64;

/// Replay file extension, without the dot
pub const FILE_EXTENSION: &str = "dem";

/// Recognized header keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKey {
    Version,
    ScreenWidth,
    ScreenHeight,
    RecordFps,
    StartTime,
}

impl HeaderKey {
    /// Keys in the order the recorder writes them
    pub const ALL: [HeaderKey; 5] = [
        HeaderKey::Version,
        HeaderKey::ScreenWidth,
        HeaderKey::ScreenHeight,
        HeaderKey::RecordFps,
        HeaderKey::StartTime,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HeaderKey::Version => "VERSION",
            HeaderKey::ScreenWidth => "SCREEN_WIDTH",
            HeaderKey::ScreenHeight => "SCREEN_HEIGHT",
            HeaderKey::RecordFps => "RECORD_FPS",
            HeaderKey::StartTime => "START_TIME",
        }
    }
}

/// Data line prefixes used from version 2 on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordPrefix {
    Command,
    Input,
    Snapshot,
}

impl RecordPrefix {
    pub fn tag(self) -> &'static str {
        match self {
            RecordPrefix::Command => "C",
            RecordPrefix::Input => "I",
            RecordPrefix::Snapshot => "S",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "C" => Some(RecordPrefix::Command),
            "I" => Some(RecordPrefix::Input),
            "S" => Some(RecordPrefix::Snapshot),
            _ => None,
        }
    }
}

/// Field layout of a snapshot line for one format version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSchema {
    /// Lines carry the `S:` prefix
    pub prefixed: bool,
    /// Fields that must be present: time, pos x/y, vel x/y, sprinting
    pub required_fields: usize,
    /// A trailing adrenaline flag may follow; missing or unparseable reads as false
    pub adrenaline_field: bool,
}

impl SnapshotSchema {
    /// Schema table keyed by declared version
    pub fn for_version(version: u32) -> Self {
        match version {
            0 | 1 => SnapshotSchema {
                prefixed: false,
                required_fields: 6,
                adrenaline_field: false,
            },
            _ => SnapshotSchema {
                prefixed: true,
                required_fields: 6,
                adrenaline_field: true,
            },
        }
    }
}

/// Shape of one raw line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind<'a> {
    /// `KEY: value` with a recognized key
    Header(HeaderKey, &'a str),
    /// Any other comma-containing line
    Data(&'a str),
    /// Blank, unknown header, or free text
    Ignored,
}

impl<'a> LineKind<'a> {
    pub(crate) fn classify(line: &'a str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        for key in HeaderKey::ALL {
            if let Some(rest) = line.strip_prefix(key.name())
                && let Some(value) = rest.strip_prefix(':')
            {
                return LineKind::Header(key, value.trim());
            }
        }
        if line.contains(',') {
            LineKind::Data(line.trim())
        } else {
            LineKind::Ignored
        }
    }
}

/// Render an epoch timestamp the way the header has always carried it:
/// shortest round-trip form, with a trailing `.0` on whole seconds.
pub(crate) fn format_epoch(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
