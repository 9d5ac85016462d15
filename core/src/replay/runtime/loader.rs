//! Replay loading
//!
//! File front-end over [`TextReader`]. Loading never fails upward: the
//! caller gets a [`LoadOutcome`] and decides which message to show.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::replay::error::LoadError;
use crate::replay::format::{FILE_EXTENSION, TextReader};
use crate::replay::types::{LogHeader, ReplayLog};

/// Result of loading one replay file
#[derive(Debug)]
pub enum LoadOutcome {
    /// Log parsed and holds at least one snapshot
    Loaded(ReplayLog),
    /// Log parsed but has no snapshots; all sequences are empty
    NoData(LogHeader),
    /// Log could not be read or is corrupt; all sequences are empty
    Failed(LoadError),
}

impl LoadOutcome {
    /// The playable log, if any
    pub fn log(&self) -> Option<&ReplayLog> {
        match self {
            LoadOutcome::Loaded(log) => Some(log),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }

    /// Convert into a plain result, mapping the no-data case to [`LoadError::NoData`]
    pub fn into_result(self) -> Result<ReplayLog, LoadError> {
        match self {
            LoadOutcome::Loaded(log) => Ok(log),
            LoadOutcome::NoData(_) => Err(LoadError::NoData),
            LoadOutcome::Failed(err) => Err(err),
        }
    }

    /// Log with every sequence empty, as handed to playback after a failed load
    pub fn into_log(self) -> ReplayLog {
        match self {
            LoadOutcome::Loaded(log) => log,
            LoadOutcome::NoData(header) => ReplayLog {
                header,
                ..Default::default()
            },
            LoadOutcome::Failed(_) => ReplayLog::default(),
        }
    }
}

/// Load a replay file from disk
pub fn load_replay(path: &Path) -> LoadOutcome {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!("Cannot open replay {}: {}", path.display(), e);
            return LoadOutcome::Failed(LoadError::Io(e));
        }
    };
    let outcome = read_replay(BufReader::new(file));
    match &outcome {
        LoadOutcome::Loaded(log) => tracing::info!(
            "Loaded {} (v{}): {} commands, {} inputs, {} snapshots, {:.2}s",
            path.display(),
            log.header.format_version,
            log.commands.len(),
            log.inputs.len(),
            log.snapshots.len(),
            log.total_duration()
        ),
        LoadOutcome::NoData(_) => {
            tracing::warn!("Replay {} has no usable records", path.display())
        }
        LoadOutcome::Failed(e) => {
            tracing::warn!("Replay {} is invalid: {}", path.display(), e)
        }
    }
    outcome
}

/// Load a replay from any buffered reader
pub fn read_replay<R: BufRead>(reader: R) -> LoadOutcome {
    match TextReader::new(reader).read_log() {
        Ok(log) if log.snapshots.is_empty() => LoadOutcome::NoData(log.header),
        Ok(log) => LoadOutcome::Loaded(log),
        Err(e) => LoadOutcome::Failed(e),
    }
}

/// List the replay files in `dir`, sorted by name
pub fn find_replay_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(FILE_EXTENSION))
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
