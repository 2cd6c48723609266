//! Drag gestures: pencil/eraser strokes and autotile painting
//!
//! A gesture edits the world as the cursor moves and collects everything it
//! touched into a single delta, handed out when the gesture ends.

use crate::commands::{AutotileDelta, CellBatch, Delta, EraserDelta, PencilDelta};
use crate::project::World;
use pok_map_core::{paint_autotile, AutotileRule, TileValue};
use std::collections::HashSet;

/// What a stroke writes into the cells it crosses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeKind {
    Pencil(TileValue),
    #[default]
    Eraser,
}

impl StrokeKind {
    fn value(&self) -> TileValue {
        match self {
            StrokeKind::Pencil(value) => *value,
            StrokeKind::Eraser => TileValue::EMPTY,
        }
    }
}

/// Tracks tile changes during a painting stroke for undo support
#[derive(Debug, Clone, Default)]
pub struct PaintStrokeTracker {
    /// Whether we're currently in a paint stroke
    pub active: bool,
    pub kind: StrokeKind,
    /// Touched cells with the value each held before the stroke reached it
    pub cells: CellBatch,
    /// Indices already in `cells`
    touched: HashSet<usize>,
    /// Last cursor cell, the start of the next interpolated segment
    last_cell: Option<(i32, i32)>,
}

impl PaintStrokeTracker {
    pub fn begin(&mut self, tile_map_index: usize, z: usize, kind: StrokeKind) {
        self.active = true;
        self.kind = kind;
        self.cells = CellBatch {
            tile_map_index,
            z,
            ..Default::default()
        };
        self.touched.clear();
        self.last_cell = None;
    }

    /// Move the cursor to `(x, y)`, painting every cell on the line from the
    /// previous cursor cell. Returns the number of cells touched for the
    /// first time.
    pub fn stroke_to(&mut self, world: &mut World, x: i32, y: i32) -> usize {
        if !self.active {
            return 0;
        }
        let points = match self.last_cell {
            Some((x0, y0)) => bresenham_line(x0, y0, x, y),
            None => vec![(x, y)],
        };
        self.last_cell = Some((x, y));

        let Some(map) = world.tile_maps.get_mut(self.cells.tile_map_index) else {
            return 0;
        };
        let z = self.cells.z;
        let value = self.kind.value();
        let mut touched = 0;
        for (px, py) in points {
            let Some(index) = map.index_of(px, py) else {
                continue;
            };
            let Some(old) = map.value(z, index) else {
                continue;
            };
            // Prior is captured on first touch only
            if self.touched.insert(index) {
                self.cells.push(index, old);
                touched += 1;
            }
            map.set_value(z, index, value);
        }
        touched
    }

    /// End the stroke, returning the delta covering every touched cell
    pub fn finish(&mut self) -> Option<Delta> {
        if !self.active {
            return None;
        }
        self.active = false;
        self.last_cell = None;
        self.touched.clear();
        let cells = std::mem::take(&mut self.cells);
        if cells.is_empty() {
            return None;
        }
        Some(match self.kind {
            StrokeKind::Pencil(new_value) => Delta::Pencil(PencilDelta { cells, new_value }),
            StrokeKind::Eraser => Delta::Eraser(EraserDelta { cells }),
        })
    }
}

/// Accumulates autotile steps of one drag into a single pending delta
#[derive(Debug, Clone, Default)]
pub struct AutotileGesture {
    pub active: bool,
    pub rule: Option<AutotileRule>,
    pub pending: AutotileDelta,
    last_cell: Option<(i32, i32)>,
}

impl AutotileGesture {
    pub fn begin(&mut self, tile_map_index: usize, z: usize, rule: AutotileRule) {
        self.active = true;
        self.rule = Some(rule);
        self.pending = AutotileDelta::new(tile_map_index, z, Default::default(), Default::default());
        self.last_cell = None;
    }

    /// Autotile every cell on the line from the previous cursor cell to
    /// `(x, y)`, joining each step into the pending delta
    pub fn paint_to(&mut self, world: &mut World, x: i32, y: i32) -> bool {
        let (true, Some(rule)) = (self.active, self.rule) else {
            return false;
        };
        let points = match self.last_cell {
            Some((x0, y0)) => bresenham_line(x0, y0, x, y),
            None => vec![(x, y)],
        };
        self.last_cell = Some((x, y));

        let tile_map_index = self.pending.tile_map_index;
        let z = self.pending.z;
        let Some(map) = world.tile_maps.get_mut(tile_map_index) else {
            return false;
        };
        let mut changed = false;
        for (px, py) in points {
            let step = paint_autotile(map, z, px, py, &rule);
            if step.is_empty() {
                continue;
            }
            changed = true;
            self.pending.join(AutotileDelta::new(
                tile_map_index,
                z,
                step.old_values,
                step.new_values,
            ));
        }
        changed
    }

    pub fn finish(&mut self) -> Option<Delta> {
        if !self.active {
            return None;
        }
        self.active = false;
        self.rule = None;
        self.last_cell = None;
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return None;
        }
        Some(Delta::Autotile(pending))
    }
}

/// Bresenham's line algorithm - generates all tile coordinates along a line
pub fn bresenham_line(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let mut points = Vec::new();

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        points.push((x, y));

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }

    points
}
