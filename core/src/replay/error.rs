//! Replay load errors

use std::io;

/// Why a replay log could not be turned into playable sequences
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be opened or read
    #[error("failed to read replay: {0}")]
    Io(#[from] io::Error),

    /// A recognized line carried a malformed field
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The file parsed but holds no state snapshots
    #[error("replay has no usable records")]
    NoData,
}

impl LoadError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        LoadError::Parse {
            line,
            message: message.into(),
        }
    }

    /// True for structurally broken files, as opposed to empty ones
    pub fn is_corrupt(&self) -> bool {
        matches!(self, LoadError::Parse { .. })
    }
}
