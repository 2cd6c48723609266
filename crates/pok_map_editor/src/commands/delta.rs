//! Reversible edit operations
//!
//! Every variant records exactly what it needs to run in both directions.
//! `redo` and `undo` are total: they are only ever called in stack order, so
//! the state they find is the state they left. A delta that references a
//! missing map panics, since that means history and world have diverged.

use crate::project::World;
use pok_map_core::link::{connect_with_ids, remove_link_side, restore_links, sever_link};
use pok_map_core::{
    resize_map, unresize_map, CellState, CoveredCells, LinkEndpoint, LinkIds, Npc, PlacedObject,
    RemovedLinks, ResizeOrigin, ResizeRecord, TileValue,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One undoable edit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Delta {
    Pencil(PencilDelta),
    Eraser(EraserDelta),
    Bucket(BucketDelta),
    Collision(CollisionDelta),
    Autotile(AutotileDelta),
    Object(ObjectDelta),
    RemoveObject(RemoveObjectDelta),
    Npc(NpcDelta),
    RemoveNpc(RemoveNpcDelta),
    Link(LinkDelta),
    RemoveLink(RemoveLinkDelta),
    Resize(ResizeDelta),
    AddLayer(AddLayerDelta),
}

impl Delta {
    pub fn undo(&mut self, world: &mut World) {
        match self {
            Delta::Pencil(d) => d.undo(world),
            Delta::Eraser(d) => d.undo(world),
            Delta::Bucket(d) => d.undo(world),
            Delta::Collision(d) => d.undo(world),
            Delta::Autotile(d) => d.undo(world),
            Delta::Object(d) => d.undo(world),
            Delta::RemoveObject(d) => d.undo(world),
            Delta::Npc(d) => d.undo(world),
            Delta::RemoveNpc(d) => d.undo(world),
            Delta::Link(d) => d.undo(world),
            Delta::RemoveLink(d) => d.undo(world),
            Delta::Resize(d) => d.undo(world),
            Delta::AddLayer(d) => d.undo(world),
        }
    }

    pub fn redo(&mut self, world: &mut World) {
        match self {
            Delta::Pencil(d) => d.redo(world),
            Delta::Eraser(d) => d.redo(world),
            Delta::Bucket(d) => d.redo(world),
            Delta::Collision(d) => d.redo(world),
            Delta::Autotile(d) => d.redo(world),
            Delta::Object(d) => d.redo(world),
            Delta::RemoveObject(d) => d.redo(world),
            Delta::Npc(d) => d.redo(world),
            Delta::RemoveNpc(d) => d.redo(world),
            Delta::Link(d) => d.redo(world),
            Delta::RemoveLink(d) => d.redo(world),
            Delta::Resize(d) => d.redo(world),
            Delta::AddLayer(d) => d.redo(world),
        }
    }

    /// Human readable name for menus ("Undo Pencil")
    pub fn description(&self) -> &'static str {
        match self {
            Delta::Pencil(_) => "Pencil",
            Delta::Eraser(_) => "Eraser",
            Delta::Bucket(_) => "Bucket Fill",
            Delta::Collision(_) => "Toggle Collision",
            Delta::Autotile(_) => "Autotile",
            Delta::Object(_) => "Place Object",
            Delta::RemoveObject(_) => "Remove Object",
            Delta::Npc(_) => "Place NPC",
            Delta::RemoveNpc(_) => "Remove NPC",
            Delta::Link(_) => "Link Maps",
            Delta::RemoveLink(_) => "Remove Link",
            Delta::Resize(_) => "Resize Map",
            Delta::AddLayer(_) => "Add Layer",
        }
    }
}

/// Tile values of a set of cells in one layer, captured before an edit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellBatch {
    pub tile_map_index: usize,
    pub z: usize,
    pub indices: Vec<usize>,
    pub old_values: Vec<TileValue>,
}

impl CellBatch {
    /// Capture the current values of `indices`, skipping duplicates and
    /// cells outside the layer
    pub fn capture(world: &World, tile_map_index: usize, z: usize, indices: &[usize]) -> Self {
        let mut batch = CellBatch {
            tile_map_index,
            z,
            ..Default::default()
        };
        let Some(map) = world.get_map(tile_map_index) else {
            return batch;
        };
        let mut seen = std::collections::HashSet::new();
        for &index in indices {
            if !seen.insert(index) {
                continue;
            }
            if let Some(value) = map.value(z, index) {
                batch.indices.push(index);
                batch.old_values.push(value);
            }
        }
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Record one more cell with its prior value
    pub fn push(&mut self, index: usize, old: TileValue) {
        self.indices.push(index);
        self.old_values.push(old);
    }

    fn fill(&self, world: &mut World, value: TileValue) {
        let map = &mut world.tile_maps[self.tile_map_index];
        for &index in &self.indices {
            map.set_value(self.z, index, value);
        }
    }

    fn restore(&self, world: &mut World) {
        let map = &mut world.tile_maps[self.tile_map_index];
        for (&index, &value) in self.indices.iter().zip(&self.old_values) {
            map.set_value(self.z, index, value);
        }
    }
}

/// Paint one tile into a set of cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PencilDelta {
    pub cells: CellBatch,
    pub new_value: TileValue,
}

impl PencilDelta {
    pub fn undo(&mut self, world: &mut World) {
        self.cells.restore(world);
    }

    pub fn redo(&mut self, world: &mut World) {
        self.cells.fill(world, self.new_value);
    }
}

/// Clear a set of cells to the empty tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EraserDelta {
    pub cells: CellBatch,
}

impl EraserDelta {
    pub fn undo(&mut self, world: &mut World) {
        self.cells.restore(world);
    }

    pub fn redo(&mut self, world: &mut World) {
        self.cells.fill(world, TileValue::EMPTY);
    }
}

/// Flood fill; `cells` is exactly the connected region found at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketDelta {
    pub cells: CellBatch,
    pub new_value: TileValue,
}

impl BucketDelta {
    pub fn undo(&mut self, world: &mut World) {
        self.cells.restore(world);
    }

    pub fn redo(&mut self, world: &mut World) {
        self.cells.fill(world, self.new_value);
    }
}

/// Toggle collision flags of a set of cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionDelta {
    pub tile_map_index: usize,
    pub z: usize,
    pub indices: Vec<usize>,
    pub old_values: Vec<bool>,
}

impl CollisionDelta {
    pub fn capture(world: &World, tile_map_index: usize, z: usize, indices: &[usize]) -> Self {
        let mut delta = CollisionDelta {
            tile_map_index,
            z,
            indices: Vec::new(),
            old_values: Vec::new(),
        };
        if let Some(map) = world.get_map(tile_map_index) {
            let mut seen = std::collections::HashSet::new();
            for &index in indices {
                if !seen.insert(index) {
                    continue;
                }
                if let Some(solid) = map.collision_at(z, index) {
                    delta.indices.push(index);
                    delta.old_values.push(solid);
                }
            }
        }
        delta
    }

    pub fn undo(&mut self, world: &mut World) {
        let map = &mut world.tile_maps[self.tile_map_index];
        for (&index, &solid) in self.indices.iter().zip(&self.old_values) {
            map.set_collision(self.z, index, solid);
        }
    }

    pub fn redo(&mut self, world: &mut World) {
        let map = &mut world.tile_maps[self.tile_map_index];
        for (&index, &solid) in self.indices.iter().zip(&self.old_values) {
            map.set_collision(self.z, index, !solid);
        }
    }
}

/// Cells rewritten by autotiling, possibly accumulated over a whole drag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutotileDelta {
    pub tile_map_index: usize,
    pub z: usize,
    pub old_values: HashMap<usize, TileValue>,
    pub new_values: HashMap<usize, TileValue>,
}

impl AutotileDelta {
    pub fn new(
        tile_map_index: usize,
        z: usize,
        old_values: HashMap<usize, TileValue>,
        new_values: HashMap<usize, TileValue>,
    ) -> Self {
        Self {
            tile_map_index,
            z,
            old_values,
            new_values,
        }
    }

    /// Merge a later step into this one.
    ///
    /// The first value ever recorded for a cell is its state before the
    /// gesture, so it is kept; the latest new value is the state after.
    pub fn join(&mut self, other: AutotileDelta) {
        for (index, value) in other.old_values {
            self.old_values.entry(index).or_insert(value);
        }
        self.new_values.extend(other.new_values);
    }

    pub fn is_empty(&self) -> bool {
        self.old_values.is_empty() && self.new_values.is_empty()
    }

    pub fn undo(&mut self, world: &mut World) {
        let map = &mut world.tile_maps[self.tile_map_index];
        for (&index, &value) in &self.old_values {
            map.set_value(self.z, index, value);
        }
    }

    pub fn redo(&mut self, world: &mut World) {
        let map = &mut world.tile_maps[self.tile_map_index];
        for (&index, &value) in &self.new_values {
            map.set_value(self.z, index, value);
        }
    }
}

/// Place an object from the palette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDelta {
    pub tile_map_index: usize,
    /// Position in the map's placed-object list
    pub placed_object_index: usize,
    pub placed: PlacedObject,
    /// Cells the object overwrote, captured on the last redo
    pub covered: Option<CoveredCells>,
}

impl ObjectDelta {
    pub fn undo(&mut self, world: &mut World) {
        let World {
            tile_maps,
            object_palette,
            ..
        } = world;
        let map = &mut tile_maps[self.tile_map_index];
        map.erase_object(self.placed.id, object_palette, self.covered.as_deref());
    }

    pub fn redo(&mut self, world: &mut World) {
        let World {
            tile_maps,
            object_palette,
            ..
        } = world;
        let prototype = &object_palette[self.placed.object_index];
        let map = &mut tile_maps[self.tile_map_index];
        self.covered = Some(map.insert_object(prototype, self.placed, self.placed_object_index));
    }
}

/// Remove a placed object: a placement run backwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveObjectDelta {
    pub object_delta: ObjectDelta,
    /// Footprint cells as they were before the last redo
    #[serde(default)]
    pub footprint: CoveredCells,
}

impl RemoveObjectDelta {
    pub fn new(object_delta: ObjectDelta) -> Self {
        Self {
            object_delta,
            footprint: Vec::new(),
        }
    }

    pub fn undo(&mut self, world: &mut World) {
        self.object_delta.redo(world);
        let placed = &self.object_delta.placed;
        let map = &mut world.tile_maps[self.object_delta.tile_map_index];
        for &(index, cell) in &self.footprint {
            map.set_cell(placed.z, index, cell);
        }
    }

    pub fn redo(&mut self, world: &mut World) {
        let placed = &self.object_delta.placed;
        let map = &world.tile_maps[self.object_delta.tile_map_index];
        self.footprint = world
            .object_palette
            .get(placed.object_index)
            .map(|proto| proto.footprint(map, placed.x, placed.y))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(index, _)| Some((index, map.cell(placed.z, index)?)))
            .collect::<Vec<(usize, CellState)>>();
        self.object_delta.undo(world);
    }
}

/// Place an NPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcDelta {
    pub tile_map_index: usize,
    pub npc_index: usize,
    pub npc: Npc,
}

impl NpcDelta {
    pub fn undo(&mut self, world: &mut World) {
        world.tile_maps[self.tile_map_index].remove_npc(self.npc.id);
    }

    pub fn redo(&mut self, world: &mut World) {
        world.tile_maps[self.tile_map_index].place_npc(self.npc.clone(), self.npc_index);
    }
}

/// Remove an NPC: a placement run backwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveNpcDelta {
    pub npc_delta: NpcDelta,
}

impl RemoveNpcDelta {
    pub fn undo(&mut self, world: &mut World) {
        self.npc_delta.redo(world);
    }

    pub fn redo(&mut self, world: &mut World) {
        self.npc_delta.undo(world);
    }
}

/// Connect two map cells with a bidirectional link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDelta {
    pub link_begin: LinkEndpoint,
    pub link_end: LinkEndpoint,
    pub link_ids: LinkIds,
}

impl LinkDelta {
    pub fn undo(&mut self, world: &mut World) {
        remove_link_side(&mut world.tile_maps, self.link_begin.tile_map_index, self.link_ids.begin);
        remove_link_side(&mut world.tile_maps, self.link_end.tile_map_index, self.link_ids.end);
    }

    pub fn redo(&mut self, world: &mut World) {
        connect_with_ids(&mut world.tile_maps, self.link_begin, self.link_end, self.link_ids);
    }
}

/// Remove both sides of the link an exit belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveLinkDelta {
    pub tile_map_index: usize,
    pub exit_id: i32,
    /// Records removed on the last redo, with their original positions
    pub removed: Vec<RemovedLinks>,
}

impl RemoveLinkDelta {
    pub fn new(tile_map_index: usize, exit_id: i32) -> Self {
        Self {
            tile_map_index,
            exit_id,
            removed: Vec::new(),
        }
    }

    pub fn undo(&mut self, world: &mut World) {
        restore_links(&mut world.tile_maps, &self.removed);
    }

    pub fn redo(&mut self, world: &mut World) {
        self.removed = sever_link(&mut world.tile_maps, self.tile_map_index, self.exit_id);
    }
}

/// Grow or shrink a map from one of its corners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeDelta {
    pub tile_map_index: usize,
    pub dx: i32,
    pub dy: i32,
    pub origin: ResizeOrigin,
    /// World offset change (pixels) keeping unmoved content in place
    pub offset_delta_x: i32,
    pub offset_delta_y: i32,
    /// What the last redo removed
    pub record: ResizeRecord,
}

impl ResizeDelta {
    pub fn new(tile_map_index: usize, dx: i32, dy: i32, origin: ResizeOrigin, tile_size: i32) -> Self {
        let (shift_x, shift_y) = origin.shift(dx, dy);
        Self {
            tile_map_index,
            dx,
            dy,
            origin,
            offset_delta_x: shift_x.saturating_mul(tile_size).saturating_neg(),
            offset_delta_y: shift_y.saturating_mul(tile_size).saturating_neg(),
            record: ResizeRecord::default(),
        }
    }

    pub fn undo(&mut self, world: &mut World) {
        unresize_map(
            &mut world.tile_maps,
            self.tile_map_index,
            self.dx,
            self.dy,
            self.origin,
            &self.record,
        );
        let offset = &mut world.offsets[self.tile_map_index];
        offset.x -= self.offset_delta_x;
        offset.y -= self.offset_delta_y;
    }

    pub fn redo(&mut self, world: &mut World) {
        let Some(record) = resize_map(
            &mut world.tile_maps,
            self.tile_map_index,
            self.dx,
            self.dy,
            self.origin,
        ) else {
            panic!(
                "resize of map {} by ({}, {}) no longer fits its history",
                self.tile_map_index, self.dx, self.dy
            );
        };
        self.record = record;
        let offset = &mut world.offsets[self.tile_map_index];
        offset.x += self.offset_delta_x;
        offset.y += self.offset_delta_y;
    }
}

/// Append an empty layer to a map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddLayerDelta {
    pub tile_map_index: usize,
}

impl AddLayerDelta {
    pub fn undo(&mut self, world: &mut World) {
        world.tile_maps[self.tile_map_index].pop_layer();
    }

    pub fn redo(&mut self, world: &mut World) {
        world.tile_maps[self.tile_map_index].add_layer();
    }
}
