//! The set of maps being edited
//!
//! This module holds the world the deltas operate on and its file handling.

mod file;

use pok_map_core::{ObjectPrototype, TileMap};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Position of a map's top-left corner in world space, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MapOffset {
    pub x: i32,
    pub y: i32,
}

impl MapOffset {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// File association of one map
#[derive(Debug, Clone, Default)]
struct MapDocument {
    path: Option<PathBuf>,
    /// Map contents at the last load or save, `None` if never saved
    saved: Option<TileMap>,
}

/// All maps of an editing session, indexed by position.
///
/// `tile_maps`, `offsets` and the per-map documents always have the same
/// length; maps are only ever appended, so indices stay valid for the whole
/// session.
#[derive(Debug, Clone, Default)]
pub struct World {
    pub tile_maps: Vec<TileMap>,
    pub offsets: Vec<MapOffset>,
    /// Objects available for placement, referenced by index
    pub object_palette: Vec<ObjectPrototype>,
    documents: Vec<MapDocument>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a map at a world position and return its index
    pub fn add_map(&mut self, map: TileMap, offset: MapOffset) -> usize {
        self.tile_maps.push(map);
        self.offsets.push(offset);
        self.documents.push(MapDocument::default());
        self.tile_maps.len() - 1
    }

    pub fn map_count(&self) -> usize {
        self.tile_maps.len()
    }

    pub fn get_map(&self, index: usize) -> Option<&TileMap> {
        self.tile_maps.get(index)
    }

    pub fn offset(&self, index: usize) -> Option<MapOffset> {
        self.offsets.get(index).copied()
    }

    /// Path the map was loaded from or last saved to
    pub fn map_path(&self, index: usize) -> Option<&PathBuf> {
        self.documents.get(index)?.path.as_ref()
    }

    /// Whether `(z, index)` addresses a cell of map `tile_map_index`
    pub fn has_cell(&self, tile_map_index: usize, z: usize, index: usize) -> bool {
        self.tile_maps
            .get(tile_map_index)
            .is_some_and(|m| m.is_valid_cell(z, index))
    }

    pub fn has_layer(&self, tile_map_index: usize, z: usize) -> bool {
        self.tile_maps
            .get(tile_map_index)
            .is_some_and(|m| z < m.layer_count())
    }

    /// Add an object to the palette and return its index
    pub fn add_object_prototype(&mut self, prototype: ObjectPrototype) -> usize {
        self.object_palette.push(prototype);
        self.object_palette.len() - 1
    }

    /// Whether any map differs from its state at the last load or save
    pub fn has_unsaved_changes(&self) -> bool {
        self.tile_maps
            .iter()
            .zip(&self.documents)
            .any(|(map, doc)| doc.saved.as_ref() != Some(map))
    }

    /// Indices of maps that differ from their last saved state
    pub fn unsaved_maps(&self) -> Vec<usize> {
        self.tile_maps
            .iter()
            .zip(&self.documents)
            .enumerate()
            .filter(|(_, (map, doc))| doc.saved.as_ref() != Some(*map))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_map_keeps_parallel_lists() {
        let mut world = World::new();
        let a = world.add_map(TileMap::new(4, 4), MapOffset::default());
        let b = world.add_map(TileMap::new(2, 2), MapOffset::new(128, 0));
        assert_eq!((a, b), (0, 1));
        assert_eq!(world.map_count(), 2);
        assert_eq!(world.offset(1), Some(MapOffset::new(128, 0)));
        assert!(world.map_path(0).is_none());
    }

    #[test]
    fn test_new_maps_are_unsaved() {
        let mut world = World::new();
        assert!(!world.has_unsaved_changes());
        world.add_map(TileMap::new(4, 4), MapOffset::default());
        assert!(world.has_unsaved_changes());
        assert_eq!(world.unsaved_maps(), vec![0]);
    }

    #[test]
    fn test_cell_queries() {
        let mut world = World::new();
        world.add_map(TileMap::new(2, 2), MapOffset::default());
        assert!(world.has_cell(0, 0, 3));
        assert!(!world.has_cell(0, 0, 4));
        assert!(!world.has_cell(0, 1, 0));
        assert!(!world.has_cell(1, 0, 0));
        assert!(world.has_layer(0, 0));
    }
}
