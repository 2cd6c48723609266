//! Recoverable editor errors: file access, scripts and preferences

use crate::preferences::PreferencesError;
use pok_map_core::MapError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Could not open {path:?}: {source}")]
    Open { path: PathBuf, source: MapError },
    #[error("Could not save {path:?}: {source}")]
    Save { path: PathBuf, source: MapError },
    #[error("Map {0} has no file path set")]
    NoPath(usize),
    #[error("No map with index {0}")]
    NoSuchMap(usize),
    #[error("Script line {line}: {source}")]
    Script {
        line: usize,
        source: serde_json::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Preferences(#[from] PreferencesError),
}
