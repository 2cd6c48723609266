//! Map file save/load operations for the world

use super::{MapDocument, MapOffset, World};
use crate::EditorError;
use pok_map_core::TileMap;
use std::path::Path;

impl World {
    /// Load a map from file and append it to the world.
    ///
    /// On failure the world is left untouched.
    pub fn open_map(&mut self, path: &Path, offset: MapOffset) -> Result<usize, EditorError> {
        let map = TileMap::load(path).map_err(|source| EditorError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let index = self.add_map(map.clone(), offset);
        self.documents[index] = MapDocument {
            path: Some(path.to_path_buf()),
            saved: Some(map),
        };
        Ok(index)
    }

    /// Save a map to `path`, or to the path it was loaded from
    pub fn save_map(&mut self, index: usize, path: Option<&Path>) -> Result<(), EditorError> {
        let map = self
            .tile_maps
            .get(index)
            .ok_or(EditorError::NoSuchMap(index))?;
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.documents[index]
                .path
                .clone()
                .ok_or(EditorError::NoPath(index))?,
        };

        map.save(&path).map_err(|source| EditorError::Save {
            path: path.clone(),
            source,
        })?;

        self.documents[index] = MapDocument {
            path: Some(path),
            saved: Some(map.clone()),
        };
        Ok(())
    }

    /// Save every map that has a path and unsaved changes
    pub fn save_all(&mut self) -> Result<usize, EditorError> {
        let mut saved = 0;
        for index in self.unsaved_maps() {
            if self.documents[index].path.is_some() {
                self.save_map(index, None)?;
                saved += 1;
            }
        }
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pok_map_core::TileValue;

    #[test]
    fn test_open_and_save_tracks_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("town.json");
        TileMap::new(3, 3).save(&path).unwrap();

        let mut world = World::new();
        let index = world.open_map(&path, MapOffset::default()).unwrap();
        assert!(!world.has_unsaved_changes());
        assert_eq!(world.map_path(index), Some(&path));

        world.tile_maps[index].set_value(0, 0, TileValue::new(1, 0));
        assert!(world.has_unsaved_changes());

        assert_eq!(world.save_all().unwrap(), 1);
        assert!(!world.has_unsaved_changes());
        assert_eq!(TileMap::load(&path).unwrap().tiles[0][0], 1);
    }

    #[test]
    fn test_failed_open_leaves_world_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"width": 2, "height": 2, "tiles": [[1]], "textureIndices": [[0]], "collision": [[false]]}"#).unwrap();

        let mut world = World::new();
        world.add_map(TileMap::new(2, 2), MapOffset::default());
        let before = world.tile_maps.clone();

        let result = world.open_map(&path, MapOffset::default());
        assert!(matches!(result, Err(EditorError::Open { .. })));
        assert_eq!(world.tile_maps, before);
        assert_eq!(world.offsets.len(), 1);
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut world = World::new();
        world.add_map(TileMap::new(2, 2), MapOffset::default());
        assert!(matches!(world.save_map(0, None), Err(EditorError::NoPath(0))));
        assert!(matches!(world.save_map(3, None), Err(EditorError::NoSuchMap(3))));
    }
}
