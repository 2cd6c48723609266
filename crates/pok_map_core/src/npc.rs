//! Non-player characters placed on maps

use crate::TileMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Facing of a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Static,
    Down,
    Left,
    Right,
    Up,
}

impl Direction {
    /// The opposite facing; `Static` has none
    pub fn inverse(&self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Static => Direction::Static,
        }
    }
}

/// An NPC standing on a map cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: Uuid,
    pub name: String,
    /// Sprite sheet path, resolved by the asset loader
    #[serde(default)]
    pub texture: String,
    /// Lines spoken when talked to
    #[serde(default)]
    pub dialogue: String,
    pub x: i32,
    pub y: i32,
    pub z: usize,
    #[serde(default)]
    pub direction: Direction,
}

impl Npc {
    pub fn new(name: impl Into<String>, x: i32, y: i32, z: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            texture: String::new(),
            dialogue: String::new(),
            x,
            y,
            z,
            direction: Direction::Static,
        }
    }
}

impl TileMap {
    /// Insert an NPC at a list position (clamped to the list length)
    pub fn place_npc(&mut self, npc: Npc, list_index: usize) {
        let at = list_index.min(self.npcs.len());
        self.npcs.insert(at, npc);
    }

    /// Remove an NPC by id, returning it with the position it held
    pub fn remove_npc(&mut self, id: Uuid) -> Option<(usize, Npc)> {
        let position = self.npc_index(id)?;
        Some((position, self.npcs.remove(position)))
    }

    pub fn npc_index(&self, id: Uuid) -> Option<usize> {
        self.npcs.iter().position(|n| n.id == id)
    }

    pub fn npc_at(&self, x: i32, y: i32) -> Option<usize> {
        self.npcs.iter().position(|n| n.x == x && n.y == y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_inverse() {
        assert_eq!(Direction::Up.inverse(), Direction::Down);
        assert_eq!(Direction::Left.inverse(), Direction::Right);
        assert_eq!(Direction::Static.inverse(), Direction::Static);
    }

    #[test]
    fn test_npc_operations() {
        let mut map = TileMap::new(5, 5);
        let a = Npc::new("Oak", 1, 1, 0);
        let b = Npc::new("Gary", 2, 2, 0);
        let a_id = a.id;

        map.place_npc(a, 0);
        map.place_npc(b, 10);
        assert_eq!(map.npcs.len(), 2);
        assert_eq!(map.npc_at(2, 2), Some(1));
        assert!(map.is_occupied(1, 1, 0));

        let (position, removed) = map.remove_npc(a_id).unwrap();
        assert_eq!(position, 0);
        assert_eq!(removed.name, "Oak");
        assert!(map.remove_npc(a_id).is_none());
    }
}
