//! Neighbour-aware tile selection (autotiling)
//!
//! A rule owns a block of 16 consecutive tile ids. Every cell holding one of
//! them is a member, and its exact id encodes which of its four neighbours
//! are members too.

use crate::layer::TileValue;
use crate::TileMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of variants in a rule's tile block
pub const AUTOTILE_VARIANTS: i32 = 16;

const NORTH: i32 = 1;
const EAST: i32 = 2;
const SOUTH: i32 = 4;
const WEST: i32 = 8;

/// Tile block used for one kind of terrain (path, water, tall grass...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutotileRule {
    pub base_tile: i32,
    pub texture_index: i32,
}

impl AutotileRule {
    pub fn new(base_tile: i32, texture_index: i32) -> Self {
        Self {
            base_tile,
            texture_index,
        }
    }

    /// A rule needs a non-negative base with room for every variant id
    pub fn is_valid(&self) -> bool {
        self.base_tile >= 0 && self.base_tile.checked_add(AUTOTILE_VARIANTS - 1).is_some()
    }

    /// Whether a cell value belongs to this rule
    pub fn is_member(&self, value: TileValue) -> bool {
        let offset = i64::from(value.tile) - i64::from(self.base_tile);
        value.texture_index == self.texture_index && (0..i64::from(AUTOTILE_VARIANTS)).contains(&offset)
    }

    /// Tile id for a member cell with the given neighbour mask
    pub fn variant(&self, mask: i32) -> TileValue {
        TileValue::new(self.base_tile.saturating_add(mask), self.texture_index)
    }
}

/// Cells rewritten by one autotile step: value before and after
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutotileStep {
    pub old_values: HashMap<usize, TileValue>,
    pub new_values: HashMap<usize, TileValue>,
}

impl AutotileStep {
    pub fn is_empty(&self) -> bool {
        self.new_values.is_empty()
    }
}

/// Neighbour mask of a cell: which of its four neighbours are members
pub fn neighbour_mask(map: &TileMap, z: usize, x: i32, y: i32, rule: &AutotileRule) -> i32 {
    let mut mask = 0;
    for (bit, nx, ny) in [
        (NORTH, x, y - 1),
        (EAST, x + 1, y),
        (SOUTH, x, y + 1),
        (WEST, x - 1, y),
    ] {
        let member = map
            .index_of(nx, ny)
            .and_then(|i| map.value(z, i))
            .is_some_and(|v| rule.is_member(v));
        if member {
            mask |= bit;
        }
    }
    mask
}

/// Make `(x, y)` a member of `rule` and recompute it and its four neighbours.
///
/// Only cells whose value actually changes are recorded. An invalid rule
/// paints nothing.
pub fn paint_autotile(map: &mut TileMap, z: usize, x: i32, y: i32, rule: &AutotileRule) -> AutotileStep {
    let mut step = AutotileStep::default();
    if !rule.is_valid() {
        return step;
    }
    let Some(center) = map.index_of(x, y) else {
        return step;
    };
    if z >= map.layer_count() {
        return step;
    }

    let mut write = |map: &mut TileMap, index: usize, value: TileValue| {
        let Some(old) = map.value(z, index) else {
            return;
        };
        if old == value {
            return;
        }
        step.old_values.entry(index).or_insert(old);
        step.new_values.insert(index, value);
        map.set_value(z, index, value);
    };

    write(map, center, rule.variant(0));

    for (cx, cy) in [(x, y), (x, y - 1), (x + 1, y), (x, y + 1), (x - 1, y)] {
        let Some(index) = map.index_of(cx, cy) else {
            continue;
        };
        let is_member = map.value(z, index).is_some_and(|v| rule.is_member(v));
        if !is_member {
            continue;
        }
        let mask = neighbour_mask(map, z, cx, cy, rule);
        write(map, index, rule.variant(mask));
    }

    step
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cell_has_no_neighbours() {
        let mut map = TileMap::new(5, 5);
        let rule = AutotileRule::new(32, 1);
        let step = paint_autotile(&mut map, 0, 2, 2, &rule);
        assert_eq!(map.value(0, 12), Some(TileValue::new(32, 1)));
        assert_eq!(step.old_values.get(&12), Some(&TileValue::EMPTY));
        assert_eq!(step.new_values.len(), 1);
    }

    #[test]
    fn test_neighbours_are_recomputed() {
        let mut map = TileMap::new(5, 5);
        let rule = AutotileRule::new(32, 1);
        paint_autotile(&mut map, 0, 2, 2, &rule);
        let step = paint_autotile(&mut map, 0, 3, 2, &rule);

        // (2,2) now has an east neighbour, (3,2) a west neighbour
        assert_eq!(map.value(0, 12), Some(TileValue::new(32 + EAST, 1)));
        assert_eq!(map.value(0, 13), Some(TileValue::new(32 + WEST, 1)));
        assert_eq!(step.old_values.get(&12), Some(&TileValue::new(32, 1)));
        assert_eq!(step.old_values.get(&13), Some(&TileValue::EMPTY));
    }

    #[test]
    fn test_non_members_are_untouched() {
        let mut map = TileMap::new(3, 3);
        map.set_value(0, 1, TileValue::new(5, 0));
        let rule = AutotileRule::new(32, 0);
        let step = paint_autotile(&mut map, 0, 1, 1, &rule);
        assert_eq!(map.value(0, 1), Some(TileValue::new(5, 0)));
        assert!(!step.old_values.contains_key(&1));
    }

    #[test]
    fn test_out_of_bounds_is_empty_step() {
        let mut map = TileMap::new(3, 3);
        let rule = AutotileRule::new(32, 0);
        assert!(paint_autotile(&mut map, 0, 5, 5, &rule).is_empty());
        assert!(paint_autotile(&mut map, 2, 1, 1, &rule).is_empty());
    }

    #[test]
    fn test_rule_near_id_limit() {
        let rule = AutotileRule::new(i32::MAX - 3, 0);
        assert!(!rule.is_valid());
        assert!(rule.is_member(TileValue::new(i32::MAX, 0)));
        assert!(!AutotileRule::new(-4, 0).is_valid());
        assert!(AutotileRule::new(i32::MAX - 15, 0).is_valid());
        assert!(AutotileRule::new(i32::MAX - 15, 0).is_member(TileValue::new(i32::MAX, 0)));

        let mut map = TileMap::new(3, 3);
        assert!(paint_autotile(&mut map, 0, 1, 1, &rule).is_empty());
        assert_eq!(map.value(0, 4), Some(TileValue::EMPTY));
    }
}
