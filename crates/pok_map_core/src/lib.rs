//! Core data structures for pok_map_editor
//!
//! This crate provides the fundamental types for representing linked tile maps:
//! - `TileMap` - A layered grid with collision, entries, exits, objects and NPCs
//! - `Entry` / `Exit` - Anchor points and the directed links between maps
//! - `ObjectPrototype` / `PlacedObject` - Multi-cell stamps written into the grid
//! - `Npc` - Characters standing on map cells
//! - Resize, flood fill and autotile algorithms over those types
//!
//! Maps reference each other by index into a flat `[TileMap]` world, never by
//! pointer, so the world-level algorithms take `&mut [TileMap]`.

mod error;
mod file;
mod fill;
mod npc;
mod object;
mod tile_map;

pub mod autotile;
pub mod layer;
pub mod link;
pub mod resize;

pub use autotile::{paint_autotile, AutotileRule, AutotileStep};
pub use error::MapError;
pub use layer::{CellState, ResizeOrigin, TileValue, EMPTY_TEXTURE_INDEX, EMPTY_TILE};
pub use link::{Entry, Exit, LinkEndpoint, LinkIds, RemovedLinks};
pub use npc::{Direction, Npc};
pub use object::{CoveredCells, ObjectPrototype, PlacedObject};
pub use resize::{resize_map, unresize_map, ClippedCell, ResizeRecord};
pub use tile_map::{extract_where, reinsert_sorted, TileMap, MAX_MAP_DIMENSION};
