//! Multi-cell objects stamped into a map's tile grid

use crate::layer::{CellState, TileValue, EMPTY_TILE};
use crate::{TileMap, MAX_MAP_DIMENSION};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// A reusable multi-cell stamp (house, tree, sign...) from the object palette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPrototype {
    pub name: String,
    pub width: i32,
    pub height: i32,
    /// Row-major tile ids; [`EMPTY_TILE`] cells are transparent and not written
    pub tiles: Vec<i32>,
    pub texture_indices: Vec<i32>,
    #[serde(default)]
    pub collision: Vec<bool>,
}

impl ObjectPrototype {
    /// Create a solid rectangle of consecutive tile ids starting at `first_tile`.
    /// Dimensions are clamped to `1..=MAX_MAP_DIMENSION`.
    pub fn new(name: impl Into<String>, width: i32, height: i32, first_tile: i32, texture_index: i32) -> Self {
        let width = width.clamp(1, MAX_MAP_DIMENSION);
        let height = height.clamp(1, MAX_MAP_DIMENSION);
        let size = (width * height) as usize;
        Self {
            name: name.into(),
            width,
            height,
            tiles: (0..width * height).map(|i| first_tile.saturating_add(i)).collect(),
            texture_indices: vec![texture_index; size],
            collision: vec![true; size],
        }
    }

    /// Whether the stamp fits the map size limit and its cell lists match
    /// its dimensions
    pub fn is_valid(&self) -> bool {
        let in_range = |d: i32| (1..=MAX_MAP_DIMENSION).contains(&d);
        if !in_range(self.width) || !in_range(self.height) {
            return false;
        }
        let size = (self.width * self.height) as usize;
        self.tiles.len() == size
            && self.texture_indices.len() == size
            && (self.collision.is_empty() || self.collision.len() == size)
    }

    /// Map cells this stamp writes when its top-left corner is at `(x, y)`,
    /// paired with the stamp cell index. Cells outside the map are clipped.
    pub fn footprint(&self, map: &TileMap, x: i32, y: i32) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        for oy in 0..self.height {
            for ox in 0..self.width {
                let i = (oy * self.width + ox) as usize;
                if self.tiles.get(i).copied().unwrap_or(EMPTY_TILE) == EMPTY_TILE {
                    continue;
                }
                if let Some(index) = map.index_of(x.saturating_add(ox), y.saturating_add(oy)) {
                    cells.push((index, i));
                }
            }
        }
        cells
    }
}

/// An object placed on a map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedObject {
    pub id: Uuid,
    /// Index of the prototype in the object palette
    pub object_index: usize,
    pub x: i32,
    pub y: i32,
    pub z: usize,
}

impl PlacedObject {
    pub fn new(object_index: usize, x: i32, y: i32, z: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            object_index,
            x,
            y,
            z,
        }
    }
}

/// Cells of one layer overwritten by a stamp, with their prior state
pub type CoveredCells = Vec<(usize, CellState)>;

impl TileMap {
    /// Write an object into the grid and insert its record at `list_index`.
    ///
    /// Returns the prior state of every overwritten cell.
    pub fn insert_object(
        &mut self,
        prototype: &ObjectPrototype,
        placed: PlacedObject,
        list_index: usize,
    ) -> CoveredCells {
        let z = placed.z;
        let mut covered = Vec::new();
        for (index, i) in prototype.footprint(self, placed.x, placed.y) {
            let Some(prior) = self.cell(z, index) else {
                continue;
            };
            covered.push((index, prior));
            let value = TileValue::new(
                prototype.tiles[i],
                prototype.texture_indices.get(i).copied().unwrap_or_default(),
            );
            let collision = prototype.collision.get(i).copied().unwrap_or(false);
            self.set_cell(z, index, CellState { value, collision });
        }
        let at = list_index.min(self.placed_objects.len());
        self.placed_objects.insert(at, placed);
        covered
    }

    /// Remove an object record by id and clear its cells from the grid.
    ///
    /// Cells listed in `covered` get their prior state back. Without them,
    /// the footprint becomes empty except where an object placed later on
    /// the same layer sits on top. Returns the record and the position it
    /// held.
    pub fn erase_object(
        &mut self,
        id: Uuid,
        palette: &[ObjectPrototype],
        covered: Option<&[(usize, CellState)]>,
    ) -> Option<(usize, PlacedObject)> {
        let position = self.placed_objects.iter().position(|o| o.id == id)?;
        let placed = self.placed_objects.remove(position);
        let z = placed.z;
        match covered {
            Some(covered) => {
                for (index, prior) in covered {
                    self.set_cell(z, *index, *prior);
                }
            }
            None => {
                let Some(prototype) = palette.get(placed.object_index) else {
                    return Some((position, placed));
                };
                let on_top: HashSet<usize> = self.placed_objects[position..]
                    .iter()
                    .filter(|above| above.z == z)
                    .filter_map(|above| Some((above, palette.get(above.object_index)?)))
                    .flat_map(|(above, proto)| proto.footprint(self, above.x, above.y))
                    .map(|(index, _)| index)
                    .collect();
                for (index, _) in prototype.footprint(self, placed.x, placed.y) {
                    if !on_top.contains(&index) {
                        self.set_cell(z, index, CellState::EMPTY);
                    }
                }
            }
        }
        Some((position, placed))
    }

    pub fn placed_object_index(&self, id: Uuid) -> Option<usize> {
        self.placed_objects.iter().position(|o| o.id == id)
    }
}
