//! Growing and shrinking maps
//!
//! Resizing moves content, so it can push entries, exits, NPCs and objects
//! off the map. Everything removed that way is recorded, including link
//! partners in other maps, so the resize can be reversed exactly.

use crate::layer::{remap_grid, CellState, ResizeOrigin, EMPTY_TEXTURE_INDEX, EMPTY_TILE};
use crate::link::{remove_links, restore_links, RemovedLinks};
use crate::tile_map::{extract_where, reinsert_sorted};
use crate::{Npc, PlacedObject, TileMap, MAX_MAP_DIMENSION};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A cell dropped by a shrink, addressed in the grid before the resize
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClippedCell {
    pub z: usize,
    pub index: usize,
    pub cell: CellState,
}

/// Everything a resize removed, with positions from before the removal.
///
/// Records of the resized map keep their pre-resize coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResizeRecord {
    pub clipped: Vec<ClippedCell>,
    pub removed_links: Vec<RemovedLinks>,
    pub removed_npcs: Vec<(usize, Npc)>,
    pub removed_objects: Vec<(usize, PlacedObject)>,
}

impl TileMap {
    /// Whether growing by `(dx, dy)` leaves at least one row and column and
    /// stays within [`MAX_MAP_DIMENSION`]
    pub fn can_resize(&self, dx: i32, dy: i32) -> bool {
        let in_range = |d: Option<i32>| d.is_some_and(|d| (1..=MAX_MAP_DIMENSION).contains(&d));
        in_range(self.width.checked_add(dx)) && in_range(self.height.checked_add(dy))
    }

    /// Reallocate every layer to the new size and translate all content.
    ///
    /// Nothing is removed here: entries, exits, NPCs and objects may end up
    /// outside the map. Returns the cells that no longer fit.
    pub fn resize_grid(&mut self, dx: i32, dy: i32, origin: ResizeOrigin) -> Vec<ClippedCell> {
        let new_width = self.width + dx;
        let new_height = self.height + dy;
        let (shift_x, shift_y) = origin.shift(dx, dy);

        let mut clipped = Vec::new();
        for z in 0..self.layer_count() {
            for index in 0..self.cell_count() {
                let (x, y) = self.coords_of(index);
                let (nx, ny) = (x + shift_x, y + shift_y);
                if nx < 0 || ny < 0 || nx >= new_width || ny >= new_height {
                    if let Some(cell) = self.cell(z, index) {
                        clipped.push(ClippedCell { z, index, cell });
                    }
                }
            }
        }

        let old_width = self.width;
        for layer in self.tiles.iter_mut() {
            *layer = remap_grid(layer, old_width, new_width, new_height, shift_x, shift_y, EMPTY_TILE);
        }
        for layer in self.texture_indices.iter_mut() {
            *layer = remap_grid(
                layer,
                old_width,
                new_width,
                new_height,
                shift_x,
                shift_y,
                EMPTY_TEXTURE_INDEX,
            );
        }
        for layer in self.collision.iter_mut() {
            *layer = remap_grid(layer, old_width, new_width, new_height, shift_x, shift_y, false);
        }
        self.width = new_width;
        self.height = new_height;

        self.translate_content(shift_x, shift_y);
        clipped
    }

    fn translate_content(&mut self, dx: i32, dy: i32) {
        for entry in self.entries.iter_mut() {
            entry.x += dx;
            entry.y += dy;
        }
        for exit in self.exits.iter_mut() {
            exit.x += dx;
            exit.y += dy;
        }
        for npc in self.npcs.iter_mut() {
            npc.x += dx;
            npc.y += dy;
        }
        for object in self.placed_objects.iter_mut() {
            object.x += dx;
            object.y += dy;
        }
    }
}

/// Resize one map of the world and remove everything left outside it,
/// cascading into links of other maps.
///
/// Returns `None` (and changes nothing) when the map would lose all rows or
/// columns. Panics if `tile_map_index` is not a map of `maps`.
pub fn resize_map(
    maps: &mut [TileMap],
    tile_map_index: usize,
    dx: i32,
    dy: i32,
    origin: ResizeOrigin,
) -> Option<ResizeRecord> {
    let map = &mut maps[tile_map_index];
    if !map.can_resize(dx, dy) {
        return None;
    }
    let (shift_x, shift_y) = origin.shift(dx, dy);
    let clipped = map.resize_grid(dx, dy, origin);

    let (width, height) = (map.width, map.height);
    let outside = |x: i32, y: i32| x < 0 || y < 0 || x >= width || y >= height;

    let dead_entries: HashSet<(usize, i32)> = map
        .entries
        .iter()
        .filter(|e| outside(e.x, e.y))
        .map(|e| (tile_map_index, e.id))
        .collect();
    let dead_exits: HashSet<(usize, i32)> = map
        .exits
        .iter()
        .filter(|e| outside(e.x, e.y))
        .map(|e| (tile_map_index, e.id))
        .collect();

    let mut removed_npcs = extract_where(&mut map.npcs, |n| outside(n.x, n.y));
    let mut removed_objects = extract_where(&mut map.placed_objects, |o| outside(o.x, o.y));
    for (_, npc) in removed_npcs.iter_mut() {
        npc.x -= shift_x;
        npc.y -= shift_y;
    }
    for (_, object) in removed_objects.iter_mut() {
        object.x -= shift_x;
        object.y -= shift_y;
    }

    let mut removed_links = remove_links(maps, dead_entries, dead_exits);
    for record in removed_links
        .iter_mut()
        .filter(|r| r.tile_map_index == tile_map_index)
    {
        for (_, entry) in record.entries.iter_mut() {
            entry.x -= shift_x;
            entry.y -= shift_y;
        }
        for (_, exit) in record.exits.iter_mut() {
            exit.x -= shift_x;
            exit.y -= shift_y;
        }
    }

    log::debug!(
        "Resized map {} by ({}, {}) from {:?}: {} cells clipped, {} link records removed",
        tile_map_index,
        dx,
        dy,
        origin,
        clipped.len(),
        removed_links.len()
    );

    Some(ResizeRecord {
        clipped,
        removed_links,
        removed_npcs,
        removed_objects,
    })
}

/// Reverse [`resize_map`]: resize back, then restore clipped cells and
/// removed records at their original positions
pub fn unresize_map(
    maps: &mut [TileMap],
    tile_map_index: usize,
    dx: i32,
    dy: i32,
    origin: ResizeOrigin,
    record: &ResizeRecord,
) {
    let map = &mut maps[tile_map_index];
    map.resize_grid(-dx, -dy, origin);
    for clipped in &record.clipped {
        map.set_cell(clipped.z, clipped.index, clipped.cell);
    }
    reinsert_sorted(&mut map.npcs, &record.removed_npcs);
    reinsert_sorted(&mut map.placed_objects, &record.removed_objects);
    restore_links(maps, &record.removed_links);
}
