//! Editor preferences persisted across sessions

mod file;

pub use file::PreferencesError;

use crate::commands::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

/// Most recently opened files kept in `recent_files`
pub const MAX_RECENT_FILES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
#[serde(default)]
pub struct EditorPreferences {
    /// Maximum number of undo steps kept; the oldest is dropped beyond it
    pub history_limit: usize,
    /// Whether recording a new edit discards the redo stack
    pub clear_redo_on_push: bool,
    /// Tile edge length in pixels, used to move map offsets on resize
    pub tile_size: i32,
    pub default_map_width: i32,
    pub default_map_height: i32,
    /// Newest first
    pub recent_files: Vec<String>,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_MAX_DEPTH,
            clear_redo_on_push: true,
            tile_size: 32,
            default_map_width: 8,
            default_map_height: 8,
            recent_files: Vec::new(),
        }
    }
}

impl EditorPreferences {
    /// Move `path` to the front of the recent files list
    pub fn add_recent_file(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.recent_files.retain(|p| *p != path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = EditorPreferences::default();
        assert_eq!(prefs.history_limit, DEFAULT_MAX_DEPTH);
        assert!(prefs.clear_redo_on_push);
        assert_eq!((prefs.default_map_width, prefs.default_map_height), (8, 8));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let prefs: EditorPreferences = serde_json::from_str(r#"{"tile_size": 16}"#).unwrap();
        assert_eq!(prefs.tile_size, 16);
        assert_eq!(prefs.history_limit, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_recent_files_dedup_and_cap() {
        let mut prefs = EditorPreferences::default();
        for i in 0..12 {
            prefs.add_recent_file(format!("map{i}.json"));
        }
        prefs.add_recent_file("map5.json");
        assert_eq!(prefs.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(prefs.recent_files[0], "map5.json");
        assert_eq!(prefs.recent_files.iter().filter(|p| *p == "map5.json").count(), 1);
    }
}
