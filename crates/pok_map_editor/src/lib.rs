//! pok_map_editor - Editing engine for worlds of linked tile maps
//!
//! This crate provides everything behind the editor's canvas:
//! - A world of maps with file load/save and unsaved-change tracking
//! - Pencil, eraser, bucket fill, collision and autotile painting
//! - Object stamps, NPCs and links between maps
//! - Resizing maps from any corner
//! - Undo/redo for every edit
//! - Persisted editor preferences
//!
//! Rendering and input are left to the host. Input arrives either as direct
//! calls on [`EditorSession`] or as [`EditorCommand`] values.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pok_map_editor::{EditorSession, MapOffset};
//! use pok_map_core::TileValue;
//!
//! let mut session = EditorSession::default();
//! let town = session.new_map(8, 8, MapOffset::default()).unwrap();
//! session.paint(town, 0, 5, 0, TileValue::new(3, 0));
//! session.undo();
//! ```

pub mod commands;
pub mod preferences;
pub mod project;
pub mod session;
pub mod tools;

mod error;

pub use pok_map_core;

pub use commands::{parse_script, CommandHistory, Delta, EditorCommand};
pub use error::EditorError;
pub use preferences::{EditorPreferences, PreferencesError};
pub use project::{MapOffset, World};
pub use session::EditorSession;
pub use tools::StrokeKind;

#[cfg(feature = "bevy")]
use bevy::prelude::{App, Plugin};

/// Adds an [`EditorSession`] built from the saved preferences
#[cfg(feature = "bevy")]
#[derive(Default)]
pub struct EditorPlugin;

#[cfg(feature = "bevy")]
impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        let preferences = EditorPreferences::load();
        app.insert_resource(EditorSession::new(preferences.clone()))
            .insert_resource(preferences);
    }
}
