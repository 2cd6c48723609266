//! The editing session: world, history, preferences and in-progress gestures
//!
//! Every editing operation goes through [`EditorSession`]. An operation that
//! changes the world applies its effect, then records the matching delta.
//! Operations with invalid arguments (unknown map or layer, cell outside the
//! map, nothing to change) do nothing and return `false`.

use crate::commands::{
    AddLayerDelta, BucketDelta, CellBatch, CollisionDelta, CommandHistory, Delta, EditorCommand,
    EraserDelta, LinkDelta, NpcDelta, ObjectDelta, PencilDelta, RemoveLinkDelta, RemoveNpcDelta,
    RemoveObjectDelta, ResizeDelta,
};
use crate::preferences::EditorPreferences;
use crate::project::{MapOffset, World};
use crate::tools::{AutotileGesture, PaintStrokeTracker, StrokeKind};
use crate::EditorError;
use pok_map_core::link::{allocate_link_ids, can_connect};
use pok_map_core::{
    AutotileRule, Entry, Exit, LinkEndpoint, Npc, ObjectPrototype, PlacedObject, ResizeOrigin,
    TileMap, TileValue, MAX_MAP_DIMENSION,
};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
pub struct EditorSession {
    pub world: World,
    pub history: CommandHistory,
    pub preferences: EditorPreferences,
    stroke: PaintStrokeTracker,
    autotile: AutotileGesture,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorPreferences::default())
    }
}

impl EditorSession {
    pub fn new(preferences: EditorPreferences) -> Self {
        Self {
            world: World::new(),
            history: CommandHistory::new(preferences.history_limit, preferences.clear_redo_on_push),
            preferences,
            stroke: PaintStrokeTracker::default(),
            autotile: AutotileGesture::default(),
        }
    }

    // ---- maps and files ----

    /// Create an empty map at a world position. Map creation is not undoable.
    ///
    /// Returns `None` when either dimension is outside `1..=MAX_MAP_DIMENSION`.
    pub fn new_map(&mut self, width: i32, height: i32, offset: MapOffset) -> Option<usize> {
        self.end_gestures();
        let in_range = |d: i32| (1..=MAX_MAP_DIMENSION).contains(&d);
        if !in_range(width) || !in_range(height) {
            log::warn!("Rejected map size {}x{}", width, height);
            return None;
        }
        let index = self.world.add_map(TileMap::new(width, height), offset);
        log::info!("Created map {} ({}x{})", index, width, height);
        Some(index)
    }

    /// Create a map with the preferred default size
    pub fn new_default_map(&mut self, offset: MapOffset) -> Option<usize> {
        self.new_map(
            self.preferences.default_map_width,
            self.preferences.default_map_height,
            offset,
        )
    }

    /// Load a map file; on failure the session is untouched
    pub fn open_map(&mut self, path: &Path, offset: MapOffset) -> Result<usize, EditorError> {
        self.end_gestures();
        let index = self.world.open_map(path, offset)?;
        self.preferences.add_recent_file(path.display().to_string());
        log::info!("Opened {:?} as map {}", path, index);
        Ok(index)
    }

    pub fn save_map(&mut self, index: usize, path: Option<&Path>) -> Result<(), EditorError> {
        self.end_gestures();
        self.world.save_map(index, path)?;
        if let Some(path) = self.world.map_path(index) {
            log::info!("Saved map {} to {:?}", index, path);
        }
        Ok(())
    }

    pub fn save_all(&mut self) -> Result<usize, EditorError> {
        self.end_gestures();
        self.world.save_all()
    }

    /// Add an object to the palette and return its index, or `None` when the
    /// stamp is malformed or larger than a map can be
    pub fn define_object(&mut self, prototype: ObjectPrototype) -> Option<usize> {
        if !prototype.is_valid() {
            log::warn!("Rejected object '{}' ({}x{})", prototype.name, prototype.width, prototype.height);
            return None;
        }
        Some(self.world.add_object_prototype(prototype))
    }

    // ---- tiles ----

    pub fn paint(&mut self, tile_map_index: usize, z: usize, x: i32, y: i32, value: TileValue) -> bool {
        self.end_gestures();
        let Some(index) = self.cell_index(tile_map_index, z, x, y) else {
            return false;
        };
        if self.world.tile_maps[tile_map_index].value(z, index) == Some(value) {
            return false;
        }
        let mut delta = PencilDelta {
            cells: CellBatch::capture(&self.world, tile_map_index, z, &[index]),
            new_value: value,
        };
        delta.redo(&mut self.world);
        self.record(Delta::Pencil(delta));
        true
    }

    pub fn erase(&mut self, tile_map_index: usize, z: usize, x: i32, y: i32) -> bool {
        self.end_gestures();
        let Some(index) = self.cell_index(tile_map_index, z, x, y) else {
            return false;
        };
        if self.world.tile_maps[tile_map_index].value(z, index) == Some(TileValue::EMPTY) {
            return false;
        }
        let mut delta = EraserDelta {
            cells: CellBatch::capture(&self.world, tile_map_index, z, &[index]),
        };
        delta.redo(&mut self.world);
        self.record(Delta::Eraser(delta));
        true
    }

    /// Flood fill the region of equal tile ids around `(x, y)` with `value`
    pub fn bucket_fill(&mut self, tile_map_index: usize, z: usize, x: i32, y: i32, value: TileValue) -> bool {
        self.end_gestures();
        let Some(seed) = self.cell_index(tile_map_index, z, x, y) else {
            return false;
        };
        let map = &self.world.tile_maps[tile_map_index];
        if map.value(z, seed) == Some(value) {
            return false;
        }
        let region = map.flood_region(z, x, y);
        let mut delta = BucketDelta {
            cells: CellBatch::capture(&self.world, tile_map_index, z, &region),
            new_value: value,
        };
        log::debug!("Bucket fill of {} cells in map {}", region.len(), tile_map_index);
        delta.redo(&mut self.world);
        self.record(Delta::Bucket(delta));
        true
    }

    pub fn toggle_collision(&mut self, tile_map_index: usize, z: usize, x: i32, y: i32) -> bool {
        self.end_gestures();
        let Some(index) = self.cell_index(tile_map_index, z, x, y) else {
            return false;
        };
        let mut delta = CollisionDelta::capture(&self.world, tile_map_index, z, &[index]);
        delta.redo(&mut self.world);
        self.record(Delta::Collision(delta));
        true
    }

    pub fn add_layer(&mut self, tile_map_index: usize) -> bool {
        self.end_gestures();
        if self.world.get_map(tile_map_index).is_none() {
            return false;
        }
        let mut delta = AddLayerDelta { tile_map_index };
        delta.redo(&mut self.world);
        self.record(Delta::AddLayer(delta));
        true
    }

    // ---- gestures ----

    /// Start a pencil or eraser drag; ends any gesture in progress
    pub fn begin_stroke(&mut self, tile_map_index: usize, z: usize, kind: StrokeKind) -> bool {
        self.end_gestures();
        if !self.world.has_layer(tile_map_index, z) {
            return false;
        }
        self.stroke.begin(tile_map_index, z, kind);
        true
    }

    pub fn stroke_to(&mut self, x: i32, y: i32) -> usize {
        self.stroke.stroke_to(&mut self.world, x, y)
    }

    /// Finish the drag, recording one delta for every cell it touched
    pub fn end_stroke(&mut self) -> bool {
        match self.stroke.finish() {
            Some(delta) => {
                self.history.push(delta);
                true
            }
            None => false,
        }
    }

    pub fn begin_autotile(&mut self, tile_map_index: usize, z: usize, rule: AutotileRule) -> bool {
        self.end_gestures();
        if !rule.is_valid() || !self.world.has_layer(tile_map_index, z) {
            return false;
        }
        self.autotile.begin(tile_map_index, z, rule);
        true
    }

    pub fn autotile_to(&mut self, x: i32, y: i32) -> bool {
        self.autotile.paint_to(&mut self.world, x, y)
    }

    /// Finish the autotile drag, recording all of its steps as one delta
    pub fn end_autotile(&mut self) -> bool {
        match self.autotile.finish() {
            Some(delta) => {
                self.history.push(delta);
                true
            }
            None => false,
        }
    }

    /// Autotile a single cell as its own undo step
    pub fn autotile(&mut self, tile_map_index: usize, z: usize, x: i32, y: i32, rule: AutotileRule) -> bool {
        self.begin_autotile(tile_map_index, z, rule) && {
            self.autotile_to(x, y);
            self.end_autotile()
        }
    }

    pub fn is_gesture_active(&self) -> bool {
        self.stroke.active || self.autotile.active
    }

    fn end_gestures(&mut self) {
        self.end_stroke();
        self.end_autotile();
    }

    // ---- objects and NPCs ----

    /// Stamp a palette object with its top-left corner at `(x, y)`
    pub fn place_object(&mut self, tile_map_index: usize, object_index: usize, x: i32, y: i32, z: usize) -> Option<Uuid> {
        self.end_gestures();
        if object_index >= self.world.object_palette.len() {
            return None;
        }
        self.cell_index(tile_map_index, z, x, y)?;
        let placed = PlacedObject::new(object_index, x, y, z);
        let mut delta = ObjectDelta {
            tile_map_index,
            placed_object_index: self.world.tile_maps[tile_map_index].placed_objects.len(),
            placed,
            covered: None,
        };
        delta.redo(&mut self.world);
        self.record(Delta::Object(delta));
        Some(placed.id)
    }

    pub fn remove_object(&mut self, tile_map_index: usize, id: Uuid) -> bool {
        self.end_gestures();
        let Some(map) = self.world.get_map(tile_map_index) else {
            return false;
        };
        let Some(position) = map.placed_object_index(id) else {
            return false;
        };
        let mut delta = RemoveObjectDelta::new(ObjectDelta {
            tile_map_index,
            placed_object_index: position,
            placed: map.placed_objects[position],
            covered: None,
        });
        delta.redo(&mut self.world);
        self.record(Delta::RemoveObject(delta));
        true
    }

    /// Topmost placed object whose stamp covers `(x, y)`
    pub fn object_at(&self, tile_map_index: usize, x: i32, y: i32) -> Option<Uuid> {
        let map = self.world.get_map(tile_map_index)?;
        let index = map.index_of(x, y)?;
        map.placed_objects
            .iter()
            .rev()
            .find(|placed| {
                self.world
                    .object_palette
                    .get(placed.object_index)
                    .is_some_and(|proto| proto.footprint(map, placed.x, placed.y).iter().any(|(i, _)| *i == index))
            })
            .map(|placed| placed.id)
    }

    /// Place an NPC on a free cell of the map
    pub fn place_npc(&mut self, tile_map_index: usize, npc: Npc) -> bool {
        self.end_gestures();
        let Some(map) = self.world.get_map(tile_map_index) else {
            return false;
        };
        if !map.contains(npc.x, npc.y) || npc.z >= map.layer_count() || map.npc_at(npc.x, npc.y).is_some() {
            return false;
        }
        let mut delta = NpcDelta {
            tile_map_index,
            npc_index: map.npcs.len(),
            npc,
        };
        delta.redo(&mut self.world);
        self.record(Delta::Npc(delta));
        true
    }

    pub fn remove_npc(&mut self, tile_map_index: usize, id: Uuid) -> bool {
        self.end_gestures();
        let Some(map) = self.world.get_map(tile_map_index) else {
            return false;
        };
        let Some(position) = map.npc_index(id) else {
            return false;
        };
        let mut delta = RemoveNpcDelta {
            npc_delta: NpcDelta {
                tile_map_index,
                npc_index: position,
                npc: map.npcs[position].clone(),
            },
        };
        delta.redo(&mut self.world);
        self.record(Delta::RemoveNpc(delta));
        true
    }

    // ---- links ----

    /// Join two cells with a bidirectional link
    pub fn link(&mut self, begin: LinkEndpoint, end: LinkEndpoint) -> bool {
        self.end_gestures();
        if !can_connect(&self.world.tile_maps, begin, end) {
            return false;
        }
        let mut delta = LinkDelta {
            link_begin: begin,
            link_end: end,
            link_ids: allocate_link_ids(&self.world.tile_maps, begin, end),
        };
        delta.redo(&mut self.world);
        self.record(Delta::Link(delta));
        true
    }

    /// Remove the link the exit with `exit_id` belongs to
    pub fn unlink(&mut self, tile_map_index: usize, exit_id: i32) -> bool {
        self.end_gestures();
        let exists = self
            .world
            .get_map(tile_map_index)
            .is_some_and(|map| map.exit_with_id(exit_id).is_some());
        if !exists {
            return false;
        }
        let mut delta = RemoveLinkDelta::new(tile_map_index, exit_id);
        delta.redo(&mut self.world);
        self.record(Delta::RemoveLink(delta));
        true
    }

    // ---- resize ----

    /// Grow (positive) or shrink (negative) a map from a corner
    pub fn resize(&mut self, tile_map_index: usize, dx: i32, dy: i32, origin: ResizeOrigin) -> bool {
        self.end_gestures();
        let Some(map) = self.world.get_map(tile_map_index) else {
            return false;
        };
        if (dx, dy) == (0, 0) || !map.can_resize(dx, dy) {
            return false;
        }
        let mut delta = ResizeDelta::new(tile_map_index, dx, dy, origin, self.preferences.tile_size);
        delta.redo(&mut self.world);
        self.record(Delta::Resize(delta));
        true
    }

    // ---- history ----

    pub fn undo(&mut self) -> bool {
        self.end_gestures();
        self.history.undo(&mut self.world)
    }

    pub fn redo(&mut self) -> bool {
        self.end_gestures();
        self.history.redo(&mut self.world)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn record(&mut self, delta: Delta) {
        self.history.push(delta);
    }

    // ---- queries ----

    /// Whether a character may not stand on `(x, y)` of layer `z`
    pub fn is_occupied(&self, tile_map_index: usize, x: i32, y: i32, z: usize) -> bool {
        self.world
            .get_map(tile_map_index)
            .is_none_or(|map| map.is_occupied(x, y, z))
    }

    pub fn entry_with_id(&self, tile_map_index: usize, id: i32) -> Option<&Entry> {
        let map = self.world.get_map(tile_map_index)?;
        map.entries.get(map.entry_with_id(id)?)
    }

    pub fn exit_at(&self, tile_map_index: usize, x: i32, y: i32) -> Option<&Exit> {
        let map = self.world.get_map(tile_map_index)?;
        map.exits.get(map.exit_at(x, y)?)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.world.has_unsaved_changes()
    }

    fn cell_index(&self, tile_map_index: usize, z: usize, x: i32, y: i32) -> Option<usize> {
        let map = self.world.get_map(tile_map_index)?;
        if z >= map.layer_count() {
            return None;
        }
        map.index_of(x, y)
    }

    // ---- commands ----

    /// Run one command. Returns whether it changed anything.
    pub fn execute(&mut self, command: &EditorCommand) -> bool {
        match command {
            EditorCommand::NewMap {
                width,
                height,
                offset_x,
                offset_y,
            } => {
                self.new_map(*width, *height, MapOffset::new(*offset_x, *offset_y))
                    .is_some()
            }
            EditorCommand::DefineObject {
                name,
                width,
                height,
                first_tile,
                texture_index,
            } => {
                let prototype = ObjectPrototype::new(name.clone(), *width, *height, *first_tile, *texture_index);
                self.define_object(prototype).is_some()
            }
            EditorCommand::Paint {
                map,
                z,
                x,
                y,
                tile,
                texture_index,
            } => self.paint(*map, *z, *x, *y, TileValue::new(*tile, *texture_index)),
            EditorCommand::Erase { map, z, x, y } => self.erase(*map, *z, *x, *y),
            EditorCommand::Fill {
                map,
                z,
                x,
                y,
                tile,
                texture_index,
            } => self.bucket_fill(*map, *z, *x, *y, TileValue::new(*tile, *texture_index)),
            EditorCommand::ToggleCollision { map, z, x, y } => self.toggle_collision(*map, *z, *x, *y),
            EditorCommand::Stroke {
                map,
                z,
                tile,
                texture_index,
                erase,
                points,
            } => {
                let kind = if *erase {
                    StrokeKind::Eraser
                } else {
                    StrokeKind::Pencil(TileValue::new(*tile, *texture_index))
                };
                if !self.begin_stroke(*map, *z, kind) {
                    return false;
                }
                for &(x, y) in points {
                    self.stroke_to(x, y);
                }
                self.end_stroke()
            }
            EditorCommand::Autotile {
                map,
                z,
                base_tile,
                texture_index,
                points,
            } => {
                if !self.begin_autotile(*map, *z, AutotileRule::new(*base_tile, *texture_index)) {
                    return false;
                }
                for &(x, y) in points {
                    self.autotile_to(x, y);
                }
                self.end_autotile()
            }
            EditorCommand::AddLayer { map } => self.add_layer(*map),
            EditorCommand::PlaceObject { map, object, x, y, z } => {
                self.place_object(*map, *object, *x, *y, *z).is_some()
            }
            EditorCommand::RemoveObject { map, x, y } => match self.object_at(*map, *x, *y) {
                Some(id) => self.remove_object(*map, id),
                None => false,
            },
            EditorCommand::PlaceNpc {
                map,
                name,
                x,
                y,
                z,
                direction,
            } => {
                let mut npc = Npc::new(name.clone(), *x, *y, *z);
                npc.direction = *direction;
                self.place_npc(*map, npc)
            }
            EditorCommand::RemoveNpc { map, x, y } => {
                let id = self
                    .world
                    .get_map(*map)
                    .and_then(|m| m.npc_at(*x, *y).map(|i| m.npcs[i].id));
                match id {
                    Some(id) => self.remove_npc(*map, id),
                    None => false,
                }
            }
            EditorCommand::Link {
                from_map,
                from_x,
                from_y,
                to_map,
                to_x,
                to_y,
            } => self.link(
                LinkEndpoint::new(*from_map, *from_x, *from_y),
                LinkEndpoint::new(*to_map, *to_x, *to_y),
            ),
            EditorCommand::Unlink { map, x, y } => match self.exit_at(*map, *x, *y).map(|e| e.id) {
                Some(id) => self.unlink(*map, id),
                None => false,
            },
            EditorCommand::Resize { map, dx, dy, origin } => self.resize(*map, *dx, *dy, *origin),
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
        }
    }

    /// Run a list of commands in order, returning how many changed anything
    pub fn run_script(&mut self, commands: &[EditorCommand]) -> usize {
        let mut applied = 0;
        for command in commands {
            if self.execute(command) {
                applied += 1;
            } else {
                log::debug!("Command had no effect: {:?}", command);
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pok_map_core::link::dangling_exits;
    use pok_map_core::AutotileRule;

    fn session_with_maps(count: usize, width: i32, height: i32) -> EditorSession {
        let mut session = EditorSession::default();
        for i in 0..count {
            session.new_map(width, height, MapOffset::new(i as i32 * 512, 0));
        }
        session
    }

    #[test]
    fn test_paint_undo_redo() {
        let mut session = session_with_maps(1, 8, 8);
        assert!(session.paint(0, 0, 5, 0, TileValue::new(3, 0)));
        assert_eq!(session.world.tile_maps[0].tiles[0][5], 3);

        assert!(session.undo());
        assert_eq!(session.world.tile_maps[0].tiles[0][5], -1);

        assert!(session.redo());
        assert_eq!(session.world.tile_maps[0].tiles[0][5], 3);
    }

    #[test]
    fn test_n_paints_round_trip() {
        let mut session = session_with_maps(1, 8, 8);
        let initial = session.world.tile_maps.clone();
        for i in 0..10 {
            assert!(session.paint(0, 0, i % 8, i / 8, TileValue::new(i, i % 3)));
        }
        let painted = session.world.tile_maps.clone();

        for _ in 0..10 {
            assert!(session.undo());
        }
        assert_eq!(session.world.tile_maps, initial);
        assert!(!session.undo());

        for _ in 0..10 {
            assert!(session.redo());
        }
        assert_eq!(session.world.tile_maps, painted);
        assert!(!session.redo());
    }

    #[test]
    fn test_invalid_arguments_are_noops() {
        let mut session = session_with_maps(1, 4, 4);
        assert!(!session.paint(0, 0, 4, 0, TileValue::new(1, 0)));
        assert!(!session.paint(0, 1, 0, 0, TileValue::new(1, 0)));
        assert!(!session.paint(3, 0, 0, 0, TileValue::new(1, 0)));
        assert!(!session.erase(0, 0, 0, 0));
        assert!(!session.add_layer(2));
        assert!(!session.resize(0, -4, 0, ResizeOrigin::TopLeft));
        assert!(!session.resize(0, 0, 0, ResizeOrigin::TopLeft));
        assert!(!session.can_undo());
    }

    #[test]
    fn test_bucket_fill_component() {
        let mut session = session_with_maps(1, 4, 4);
        // Wall splitting the map into two components
        for y in 0..4 {
            session.paint(0, 0, 2, y, TileValue::new(7, 0));
        }
        assert!(session.bucket_fill(0, 0, 0, 0, TileValue::new(1, 2)));

        let map = &session.world.tile_maps[0];
        for y in 0..4 {
            assert_eq!(map.tiles[0][(y * 4) as usize], 1);
            assert_eq!(map.tiles[0][(y * 4 + 1) as usize], 1);
            assert_eq!(map.tiles[0][(y * 4 + 2) as usize], 7);
            assert_eq!(map.tiles[0][(y * 4 + 3) as usize], -1);
            assert_eq!(map.texture_indices[0][(y * 4) as usize], 2);
        }

        // Filling with the seed's own value records nothing
        let depth = session.history.undo_len();
        assert!(!session.bucket_fill(0, 0, 0, 0, TileValue::new(1, 2)));
        assert_eq!(session.history.undo_len(), depth);

        session.undo();
        assert_eq!(session.world.tile_maps[0].tiles[0][0], -1);
        assert_eq!(session.world.tile_maps[0].tiles[0][2], 7);
    }

    #[test]
    fn test_toggle_collision_and_occupancy() {
        let mut session = session_with_maps(1, 4, 4);
        assert!(!session.is_occupied(0, 1, 1, 0));
        assert!(session.toggle_collision(0, 0, 1, 1));
        assert!(session.is_occupied(0, 1, 1, 0));
        assert!(session.is_occupied(0, -1, 0, 0));
        assert!(session.is_occupied(4, 0, 0, 0));

        session.undo();
        assert!(!session.is_occupied(0, 1, 1, 0));

        assert!(session.place_npc(0, Npc::new("Oak", 2, 2, 0)));
        assert!(session.is_occupied(0, 2, 2, 0));
        assert!(!session.place_npc(0, Npc::new("Gary", 2, 2, 0)));
    }

    #[test]
    fn test_stroke_is_one_undo_step() {
        let mut session = session_with_maps(1, 8, 8);
        assert!(session.begin_stroke(0, 0, StrokeKind::Pencil(TileValue::new(2, 0))));
        session.stroke_to(0, 0);
        session.stroke_to(4, 4);
        assert!(session.end_stroke());
        assert_eq!(session.history.undo_len(), 1);
        assert_eq!(session.world.tile_maps[0].tiles[0][2 * 8 + 2], 2);

        session.undo();
        assert!(session.world.tile_maps[0].tiles[0].iter().all(|&t| t == -1));
    }

    #[test]
    fn test_undo_commits_pending_stroke() {
        let mut session = session_with_maps(1, 4, 4);
        session.begin_stroke(0, 0, StrokeKind::Pencil(TileValue::new(2, 0)));
        session.stroke_to(1, 1);
        assert!(session.is_gesture_active());

        // The stroke is recorded before undo runs, so undo reverts it
        assert!(session.undo());
        assert!(!session.is_gesture_active());
        assert_eq!(session.world.tile_maps[0].tiles[0][5], -1);
        assert!(session.redo());
        assert_eq!(session.world.tile_maps[0].tiles[0][5], 2);
    }

    #[test]
    fn test_autotile_gesture_undo() {
        let mut session = session_with_maps(1, 5, 5);
        let before = session.world.tile_maps.clone();
        let rule = AutotileRule::new(16, 0);

        session.begin_autotile(0, 0, rule);
        session.autotile_to(1, 1);
        session.autotile_to(1, 3);
        session.autotile_to(3, 3);
        assert!(session.end_autotile());
        let after = session.world.tile_maps.clone();
        assert_eq!(session.history.undo_len(), 1);

        session.undo();
        assert_eq!(session.world.tile_maps, before);
        session.redo();
        assert_eq!(session.world.tile_maps, after);
    }

    #[test]
    fn test_single_autotile() {
        let mut session = session_with_maps(1, 3, 3);
        let rule = AutotileRule::new(32, 0);
        assert!(session.autotile(0, 0, 1, 1, rule));
        assert!(session.autotile(0, 0, 2, 1, rule));
        assert_eq!(session.world.tile_maps[0].tiles[0][4], 32 + 2);
        assert_eq!(session.world.tile_maps[0].tiles[0][5], 32 + 8);
        session.undo();
        assert_eq!(session.world.tile_maps[0].tiles[0][4], 32);
        assert_eq!(session.world.tile_maps[0].tiles[0][5], -1);
    }

    #[test]
    fn test_object_place_remove_undo() {
        let mut session = session_with_maps(1, 4, 4);
        let rock = session.define_object(ObjectPrototype::new("Rock", 2, 2, 100, 1)).unwrap();
        session.paint(0, 0, 1, 1, TileValue::new(5, 0));
        let before = session.world.tile_maps.clone();

        let id = session.place_object(0, rock, 1, 1, 0).unwrap();
        assert_eq!(session.object_at(0, 2, 2), Some(id));
        assert!(session.is_occupied(0, 1, 1, 0));
        let placed = session.world.tile_maps.clone();

        assert!(session.remove_object(0, id));
        assert!(session.object_at(0, 2, 2).is_none());

        session.undo();
        assert_eq!(session.world.tile_maps, placed);
        session.undo();
        assert_eq!(session.world.tile_maps, before);
        session.redo();
        assert_eq!(session.world.tile_maps, placed);
    }

    #[test]
    fn test_remove_object_keeps_object_stacked_on_top() {
        let mut session = session_with_maps(1, 4, 4);
        let house = session.define_object(ObjectPrototype::new("House", 2, 2, 100, 1)).unwrap();
        let tree = session.define_object(ObjectPrototype::new("Tree", 2, 2, 40, 0)).unwrap();
        let lower = session.place_object(0, house, 0, 0, 0).unwrap();
        let upper = session.place_object(0, tree, 1, 1, 0).unwrap();
        let stacked = session.world.tile_maps.clone();

        assert!(session.remove_object(0, lower));
        let map = &session.world.tile_maps[0];
        assert_eq!(map.tiles[0][0], -1);
        assert_eq!(map.tiles[0][5], 40);
        assert_eq!(map.tiles[0][10], 43);
        assert_eq!(session.object_at(0, 1, 1), Some(upper));
        let removed = session.world.tile_maps.clone();

        session.undo();
        assert_eq!(session.world.tile_maps, stacked);
        session.redo();
        assert_eq!(session.world.tile_maps, removed);
    }

    #[test]
    fn test_oversized_requests_are_rejected() {
        let mut session = session_with_maps(1, 4, 4);
        assert!(!session.resize(0, i32::MAX, 0, ResizeOrigin::TopLeft));
        assert!(!session.resize(0, 0, i32::MIN, ResizeOrigin::BottomRight));
        assert_eq!(session.world.tile_maps[0].width, 4);

        assert!(session.new_map(65536, 65536, MapOffset::default()).is_none());
        assert!(session.new_map(0, 4, MapOffset::default()).is_none());
        assert_eq!(session.world.map_count(), 1);

        let mut wall = ObjectPrototype::new("Wall", 2, 2, 0, 0);
        wall.width = i32::MAX;
        assert!(session.define_object(wall).is_none());
        assert!(session.world.object_palette.is_empty());

        assert!(!session.autotile(0, 0, 1, 1, AutotileRule::new(i32::MAX - 3, 0)));
        assert!(!session.can_undo());
    }

    #[test]
    fn test_unlink_keeps_other_doors_to_shared_entry() {
        let mut session = session_with_maps(3, 4, 4);
        session.world.tile_maps[1].entries.push(Entry { x: 1, y: 1, id: 0 });
        session.world.tile_maps[0].exits.push(Exit {
            id: 0,
            x: 2,
            y: 2,
            target_map_index: 1,
            target_entry_id: 0,
        });
        session.world.tile_maps[2].exits.push(Exit {
            id: 4,
            x: 3,
            y: 0,
            target_map_index: 1,
            target_entry_id: 0,
        });
        let before = session.world.tile_maps.clone();

        assert!(session.unlink(0, 0));
        assert!(session.world.tile_maps[0].exits.is_empty());
        assert_eq!(session.world.tile_maps[1].entries.len(), 1);
        assert_eq!(session.world.tile_maps[2].exits.len(), 1);
        assert!(dangling_exits(&session.world.tile_maps).is_empty());

        session.undo();
        assert_eq!(session.world.tile_maps, before);
    }

    #[test]
    fn test_object_clipped_at_edge() {
        let mut session = session_with_maps(1, 3, 3);
        let tree = session.define_object(ObjectPrototype::new("Tree", 2, 2, 40, 0)).unwrap();
        assert!(session.place_object(0, tree, 2, 2, 0).is_some());
        assert_eq!(session.world.tile_maps[0].tiles[0][8], 40);
        assert!(session.place_object(0, 9, 0, 0, 0).is_none());
        assert!(session.place_object(0, tree, 3, 0, 0).is_none());
    }

    #[test]
    fn test_npc_remove_restores_position() {
        let mut session = session_with_maps(1, 4, 4);
        session.place_npc(0, Npc::new("A", 0, 0, 0));
        session.place_npc(0, Npc::new("B", 1, 0, 0));
        session.place_npc(0, Npc::new("C", 2, 0, 0));
        let before = session.world.tile_maps[0].npcs.clone();

        let id = before[1].id;
        assert!(session.remove_npc(0, id));
        assert_eq!(session.world.tile_maps[0].npcs.len(), 2);
        session.undo();
        assert_eq!(session.world.tile_maps[0].npcs, before);
    }

    #[test]
    fn test_link_and_unlink() {
        let mut session = session_with_maps(2, 4, 4);
        let a = LinkEndpoint::new(0, 1, 1);
        let b = LinkEndpoint::new(1, 2, 3);
        assert!(session.link(a, b));
        assert!(!session.link(a, LinkEndpoint::new(1, 0, 0)));
        assert!(!session.link(a, a));

        let exit = *session.exit_at(0, 1, 1).unwrap();
        let entry = session.entry_with_id(1, exit.target_entry_id).unwrap();
        assert_eq!((entry.x, entry.y), (2, 3));
        let linked = session.world.tile_maps.clone();

        assert!(session.unlink(1, session.exit_at(1, 2, 3).unwrap().id));
        assert!(session.world.tile_maps.iter().all(|m| m.exits.is_empty() && m.entries.is_empty()));

        session.undo();
        assert_eq!(session.world.tile_maps, linked);
        session.undo();
        assert!(session.world.tile_maps.iter().all(|m| m.exits.is_empty()));
        session.redo();
        assert_eq!(session.world.tile_maps, linked);
    }

    #[test]
    fn test_remove_link_restores_original_positions() {
        let mut session = session_with_maps(2, 6, 6);
        session.link(LinkEndpoint::new(0, 0, 0), LinkEndpoint::new(1, 0, 0));
        session.link(LinkEndpoint::new(0, 1, 0), LinkEndpoint::new(1, 1, 0));
        session.link(LinkEndpoint::new(0, 2, 0), LinkEndpoint::new(1, 2, 0));
        let before = session.world.tile_maps.clone();

        // The middle link of both lists
        let id = session.exit_at(0, 1, 0).unwrap().id;
        assert!(session.unlink(0, id));
        assert_eq!(session.world.tile_maps[0].exits.len(), 2);
        assert_eq!(session.world.tile_maps[1].entries.len(), 2);

        session.undo();
        assert_eq!(session.world.tile_maps, before);
    }

    #[test]
    fn test_resize_grow_top_left() {
        let mut session = session_with_maps(2, 4, 4);
        session.link(LinkEndpoint::new(0, 3, 0), LinkEndpoint::new(1, 0, 0));
        session.world.tile_maps[0].entries.push(Entry { x: 3, y: 1, id: 9 });

        assert!(session.resize(0, 2, 0, ResizeOrigin::TopLeft));
        let map = &session.world.tile_maps[0];
        assert_eq!((map.width, map.height), (6, 4));
        assert_eq!(map.exits[0].x, 5);
        assert!(map.entries.iter().any(|e| e.id == 9 && e.x == 5));
        assert_eq!(session.world.offset(0), Some(MapOffset::new(-64, 0)));
        assert!(dangling_exits(&session.world.tile_maps).is_empty());
    }

    #[test]
    fn test_resize_shrink_undo_restores_links() {
        let mut session = session_with_maps(2, 4, 4);
        session.paint(0, 0, 3, 3, TileValue::new(8, 1));
        session.link(LinkEndpoint::new(0, 3, 3), LinkEndpoint::new(1, 1, 1));
        session.link(LinkEndpoint::new(0, 0, 0), LinkEndpoint::new(1, 2, 2));
        session.place_npc(0, Npc::new("Edge", 3, 2, 0));
        let before = session.world.tile_maps.clone();

        assert!(session.resize(0, -1, -1, ResizeOrigin::BottomRight));
        let map = &session.world.tile_maps[0];
        assert_eq!((map.width, map.height), (3, 3));
        assert_eq!(map.exits.len(), 1);
        assert!(map.npcs.is_empty());
        // The partner side in map 1 went too
        assert_eq!(session.world.tile_maps[1].exits.len(), 1);
        assert!(dangling_exits(&session.world.tile_maps).is_empty());

        assert!(session.undo());
        assert_eq!(session.world.tile_maps, before);
        assert_eq!(session.world.offset(0), Some(MapOffset::new(0, 0)));

        assert!(session.redo());
        assert_eq!(session.world.tile_maps[0].width, 3);
    }

    #[test]
    fn test_resize_every_origin_round_trips() {
        for &origin in ResizeOrigin::all() {
            for (dx, dy) in [(2, 1), (-2, -1), (1, -3)] {
                let mut session = session_with_maps(2, 5, 5);
                for i in 0..5 {
                    session.paint(0, 0, i, i, TileValue::new(i, 0));
                }
                session.link(LinkEndpoint::new(0, 4, 4), LinkEndpoint::new(1, 0, 0));
                session.link(LinkEndpoint::new(0, 0, 0), LinkEndpoint::new(0, 2, 2));
                let before = session.world.tile_maps.clone();

                assert!(session.resize(0, dx, dy, origin));
                assert!(dangling_exits(&session.world.tile_maps).is_empty());
                let after = session.world.tile_maps.clone();

                session.undo();
                assert_eq!(session.world.tile_maps, before, "{origin:?} ({dx}, {dy})");
                session.redo();
                assert_eq!(session.world.tile_maps, after, "{origin:?} ({dx}, {dy})");
            }
        }
    }

    #[test]
    fn test_add_layer_undo() {
        let mut session = session_with_maps(1, 2, 2);
        assert!(session.add_layer(0));
        assert!(session.paint(0, 1, 0, 0, TileValue::new(1, 0)));
        session.undo();
        session.undo();
        assert_eq!(session.world.tile_maps[0].layer_count(), 1);
    }

    #[test]
    fn test_unsaved_changes_follow_undo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route.json");
        TileMap::new(4, 4).save(&path).unwrap();

        let mut session = EditorSession::default();
        let index = session.open_map(&path, MapOffset::default()).unwrap();
        assert!(!session.has_unsaved_changes());
        assert_eq!(session.preferences.recent_files[0], path.display().to_string());

        session.paint(index, 0, 0, 0, TileValue::new(4, 0));
        assert!(session.has_unsaved_changes());
        session.undo();
        assert!(!session.has_unsaved_changes());

        session.redo();
        session.save_map(index, None).unwrap();
        assert!(!session.has_unsaved_changes());
        session.undo();
        assert!(session.has_unsaved_changes());
    }

    #[test]
    fn test_failed_open_keeps_session() {
        let mut session = session_with_maps(1, 2, 2);
        let result = session.open_map(Path::new("/nonexistent/map.json"), MapOffset::default());
        assert!(result.is_err());
        assert_eq!(session.world.map_count(), 1);
        assert!(session.preferences.recent_files.is_empty());
    }

    #[test]
    fn test_history_limit_from_preferences() {
        let mut session = EditorSession::new(EditorPreferences {
            history_limit: 3,
            ..Default::default()
        });
        session.new_map(8, 8, MapOffset::default());
        for i in 0..6 {
            session.paint(0, 0, i, 0, TileValue::new(1, 0));
        }
        assert_eq!(session.history.undo_len(), 3);
    }

    #[test]
    fn test_execute_commands() {
        let mut session = EditorSession::default();
        let script = crate::commands::parse_script(
            r#"
{"command": "new_map", "width": 8, "height": 8}
{"command": "new_map", "width": 4, "height": 4, "offset_x": 512}
{"command": "define_object", "name": "Sign", "width": 1, "height": 1, "first_tile": 60}
{"command": "paint", "map": 0, "x": 5, "y": 0, "tile": 3}
{"command": "fill", "map": 1, "x": 0, "y": 0, "tile": 2}
{"command": "place_object", "map": 0, "object": 0, "x": 1, "y": 1}
{"command": "place_npc", "map": 0, "name": "Mom", "x": 2, "y": 2, "direction": "Down"}
{"command": "link", "from_map": 0, "from_x": 7, "from_y": 7, "to_map": 1, "to_x": 0, "to_y": 0}
{"command": "stroke", "map": 1, "tile": 9, "points": [[0, 3], [3, 3]]}
{"command": "remove_npc", "map": 0, "x": 2, "y": 2}
{"command": "unlink", "map": 1, "x": 0, "y": 0}
{"command": "undo"}
{"command": "remove_object", "map": 0, "x": 5, "y": 5}
"#,
        )
        .unwrap();

        // The last command hits no object
        assert_eq!(session.run_script(&script), script.len() - 1);
        let town = &session.world.tile_maps[0];
        assert_eq!(town.tiles[0][5], 3);
        assert_eq!(town.tiles[0][9], 60);
        assert!(town.npcs.is_empty());
        assert_eq!(town.exits.len(), 1);
        assert_eq!(session.world.tile_maps[1].tiles[0][13], 9);
        assert_eq!(session.world.tile_maps[1].tiles[0][0], 2);
    }
}
