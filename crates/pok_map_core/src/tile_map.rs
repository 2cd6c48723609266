//! A single map: layered tile grids plus the entries, exits, objects and NPCs placed on it

use crate::layer::{CellState, TileValue, EMPTY_TEXTURE_INDEX, EMPTY_TILE};
use crate::{Entry, Exit, MapError, Npc, PlacedObject};
use serde::{Deserialize, Serialize};

/// Largest width or height a map may have
pub const MAX_MAP_DIMENSION: i32 = 4096;

/// A tile map with one or more layers of equal size.
///
/// `tiles`, `texture_indices` and `collision` are indexed `[layer][y * width + x]`
/// and always have the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(bevy::asset::Asset, bevy::reflect::TypePath))]
#[serde(rename_all = "camelCase")]
pub struct TileMap {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<Vec<i32>>,
    pub texture_indices: Vec<Vec<i32>>,
    pub collision: Vec<Vec<bool>>,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub exits: Vec<Exit>,
    #[serde(default)]
    pub npcs: Vec<Npc>,
    #[serde(default)]
    pub placed_objects: Vec<PlacedObject>,
}

impl TileMap {
    /// Create an empty single-layer map. Dimensions are clamped to
    /// `1..=MAX_MAP_DIMENSION`.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.clamp(1, MAX_MAP_DIMENSION);
        let height = height.clamp(1, MAX_MAP_DIMENSION);
        let size = (width * height) as usize;
        Self {
            width,
            height,
            tiles: vec![vec![EMPTY_TILE; size]],
            texture_indices: vec![vec![EMPTY_TEXTURE_INDEX; size]],
            collision: vec![vec![false; size]],
            entries: Vec::new(),
            exits: Vec::new(),
            npcs: Vec::new(),
            placed_objects: Vec::new(),
        }
    }

    /// Number of cells in every layer
    pub fn cell_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn layer_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Cell index for a coordinate, `None` when outside the map
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if self.contains(x, y) {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    /// Coordinate of a cell index
    pub fn coords_of(&self, index: usize) -> (i32, i32) {
        let index = index as i32;
        (index % self.width, index / self.width)
    }

    /// Whether `(z, index)` addresses an allocated cell
    pub fn is_valid_cell(&self, z: usize, index: usize) -> bool {
        z < self.layer_count() && index < self.cell_count()
    }

    /// Get the tile and texture at a cell
    pub fn value(&self, z: usize, index: usize) -> Option<TileValue> {
        let tile = *self.tiles.get(z)?.get(index)?;
        let texture_index = *self.texture_indices.get(z)?.get(index)?;
        Some(TileValue::new(tile, texture_index))
    }

    /// Set the tile and texture at a cell. Returns false for cells outside the layer.
    pub fn set_value(&mut self, z: usize, index: usize, value: TileValue) -> bool {
        if !self.is_valid_cell(z, index) {
            return false;
        }
        self.tiles[z][index] = value.tile;
        self.texture_indices[z][index] = value.texture_index;
        true
    }

    pub fn collision_at(&self, z: usize, index: usize) -> Option<bool> {
        self.collision.get(z)?.get(index).copied()
    }

    pub fn set_collision(&mut self, z: usize, index: usize, solid: bool) -> bool {
        if !self.is_valid_cell(z, index) {
            return false;
        }
        self.collision[z][index] = solid;
        true
    }

    /// Get tile, texture and collision of a cell
    pub fn cell(&self, z: usize, index: usize) -> Option<CellState> {
        Some(CellState {
            value: self.value(z, index)?,
            collision: self.collision_at(z, index)?,
        })
    }

    pub fn set_cell(&mut self, z: usize, index: usize, cell: CellState) -> bool {
        self.set_value(z, index, cell.value) && self.set_collision(z, index, cell.collision)
    }

    /// Append an empty layer
    pub fn add_layer(&mut self) {
        let size = self.cell_count();
        self.tiles.push(vec![EMPTY_TILE; size]);
        self.texture_indices.push(vec![EMPTY_TEXTURE_INDEX; size]);
        self.collision.push(vec![false; size]);
    }

    /// Remove the topmost layer, keeping at least one
    pub fn pop_layer(&mut self) -> bool {
        if self.layer_count() <= 1 {
            return false;
        }
        self.tiles.pop();
        self.texture_indices.pop();
        self.collision.pop();
        true
    }

    /// Whether a character may not stand on a cell: outside the map, on a
    /// missing layer, on a collision cell or on a cell held by an NPC
    pub fn is_occupied(&self, x: i32, y: i32, z: usize) -> bool {
        let Some(index) = self.index_of(x, y) else {
            return true;
        };
        match self.collision_at(z, index) {
            None | Some(true) => return true,
            Some(false) => {}
        }
        self.npcs.iter().any(|npc| npc.x == x && npc.y == y)
    }

    /// Position of the entry with the given id
    pub fn entry_with_id(&self, id: i32) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn exit_with_id(&self, id: i32) -> Option<usize> {
        self.exits.iter().position(|e| e.id == id)
    }

    /// Position of the exit placed on a cell
    pub fn exit_at(&self, x: i32, y: i32) -> Option<usize> {
        self.exits.iter().position(|e| e.x == x && e.y == y)
    }

    pub fn entry_at(&self, x: i32, y: i32) -> Option<usize> {
        self.entries.iter().position(|e| e.x == x && e.y == y)
    }

    /// Check that every layer array has `width * height` cells
    pub fn validate(&self) -> Result<(), MapError> {
        let in_range = |d: i32| (1..=MAX_MAP_DIMENSION).contains(&d);
        if !in_range(self.width) || !in_range(self.height) {
            return Err(MapError::Shape(format!(
                "dimensions must be within 1..={}, got {}x{}",
                MAX_MAP_DIMENSION, self.width, self.height
            )));
        }
        if self.tiles.is_empty() {
            return Err(MapError::Shape("map has no layers".to_string()));
        }
        if self.texture_indices.len() != self.tiles.len() || self.collision.len() != self.tiles.len()
        {
            return Err(MapError::Shape(format!(
                "layer count mismatch: {} tile layers, {} texture layers, {} collision layers",
                self.tiles.len(),
                self.texture_indices.len(),
                self.collision.len()
            )));
        }
        let size = self.cell_count();
        for z in 0..self.tiles.len() {
            let lens = [
                self.tiles[z].len(),
                self.texture_indices[z].len(),
                self.collision[z].len(),
            ];
            if lens.iter().any(|&len| len != size) {
                return Err(MapError::Shape(format!(
                    "layer {} has {:?} cells, expected {}",
                    z, lens, size
                )));
            }
        }
        Ok(())
    }
}

/// Remove every element matching `pred`, returning each with the position it
/// held before anything was removed
pub fn extract_where<T>(list: &mut Vec<T>, mut pred: impl FnMut(&T) -> bool) -> Vec<(usize, T)> {
    let mut removed = Vec::new();
    let mut kept = Vec::with_capacity(list.len());
    for (i, item) in list.drain(..).enumerate() {
        if pred(&item) {
            removed.push((i, item));
        } else {
            kept.push(item);
        }
    }
    *list = kept;
    removed
}

/// Undo [`extract_where`]: insert elements back at their recorded positions.
///
/// Positions are processed lowest first so every insertion lands where it
/// was before the removal.
pub fn reinsert_sorted<T: Clone>(list: &mut Vec<T>, removed: &[(usize, T)]) {
    let mut ordered: Vec<&(usize, T)> = removed.iter().collect();
    ordered.sort_by_key(|(i, _)| *i);
    for (i, item) in ordered {
        let at = (*i).min(list.len());
        list.insert(at, item.clone());
    }
}
