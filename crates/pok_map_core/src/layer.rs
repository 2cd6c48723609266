//! Per-layer cell values and grid helpers

use serde::{Deserialize, Serialize};

/// Tile id stored in cells with nothing painted
pub const EMPTY_TILE: i32 = -1;

/// Texture index paired with [`EMPTY_TILE`]
pub const EMPTY_TEXTURE_INDEX: i32 = 0;

/// A tile id together with the texture (tileset image) it is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileValue {
    pub tile: i32,
    pub texture_index: i32,
}

impl TileValue {
    pub const EMPTY: TileValue = TileValue {
        tile: EMPTY_TILE,
        texture_index: EMPTY_TEXTURE_INDEX,
    };

    pub fn new(tile: i32, texture_index: i32) -> Self {
        Self {
            tile,
            texture_index,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tile == EMPTY_TILE
    }
}

impl Default for TileValue {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Everything a single cell of a single layer holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellState {
    pub value: TileValue,
    pub collision: bool,
}

impl CellState {
    pub const EMPTY: CellState = CellState {
        value: TileValue::EMPTY,
        collision: false,
    };
}

/// Corner of a map that moves when the map is resized.
///
/// Growing from a left corner adds columns on the left, so existing content
/// shifts right; growing from a top corner adds rows on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResizeOrigin {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeOrigin {
    /// Translation applied to existing content when resizing by `(dx, dy)`
    pub fn shift(&self, dx: i32, dy: i32) -> (i32, i32) {
        match self {
            ResizeOrigin::TopLeft => (dx, dy),
            ResizeOrigin::TopRight => (0, dy),
            ResizeOrigin::BottomLeft => (dx, 0),
            ResizeOrigin::BottomRight => (0, 0),
        }
    }

    /// Returns all origin variants for UI enumeration
    pub fn all() -> &'static [ResizeOrigin] {
        &[
            ResizeOrigin::TopLeft,
            ResizeOrigin::TopRight,
            ResizeOrigin::BottomLeft,
            ResizeOrigin::BottomRight,
        ]
    }
}

/// Copy a row-major grid into a grid of a new size, translating every cell by
/// `(shift_x, shift_y)`. Cells with no source are set to `fill`; source cells
/// that land outside the new grid are dropped.
pub fn remap_grid<T: Clone>(
    cells: &[T],
    old_width: i32,
    new_width: i32,
    new_height: i32,
    shift_x: i32,
    shift_y: i32,
    fill: T,
) -> Vec<T> {
    let mut out = vec![fill; (new_width * new_height) as usize];
    for (i, cell) in cells.iter().enumerate() {
        let x = i as i32 % old_width + shift_x;
        let y = i as i32 / old_width + shift_y;
        if x >= 0 && y >= 0 && x < new_width && y < new_height {
            out[(y * new_width + x) as usize] = cell.clone();
        }
    }
    out
}
