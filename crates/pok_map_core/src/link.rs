//! Entries, exits and the links that join maps together
//!
//! Maps reference each other purely by index into the world's map list and
//! entries/exits by per-map integer ids, so cyclic links (A → B → A) need no
//! shared ownership.
//!
//! A link joins two endpoints. Each side gets an [`Entry`] and an [`Exit`]
//! sharing one id that is fresh within that map; each side's exit targets the
//! other side's entry.

use crate::tile_map::{extract_where, reinsert_sorted};
use crate::TileMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An anchor point other maps may link into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub x: i32,
    pub y: i32,
    pub id: i32,
}

/// A directed link from a cell to an entry of another (or the same) map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exit {
    pub id: i32,
    pub x: i32,
    pub y: i32,
    pub target_map_index: i32,
    pub target_entry_id: i32,
}

/// One end of a link: a cell in a map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEndpoint {
    pub tile_map_index: usize,
    pub x: i32,
    pub y: i32,
}

impl LinkEndpoint {
    pub fn new(tile_map_index: usize, x: i32, y: i32) -> Self {
        Self {
            tile_map_index,
            x,
            y,
        }
    }
}

/// Ids assigned to the two sides of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkIds {
    pub begin: i32,
    pub end: i32,
}

/// Entries and exits removed from one map, each with the list position it
/// held before removal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemovedLinks {
    pub tile_map_index: usize,
    pub entries: Vec<(usize, Entry)>,
    pub exits: Vec<(usize, Exit)>,
}

impl RemovedLinks {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.exits.is_empty()
    }
}

/// One past the largest id used by any entry or exit of the map
pub fn next_link_id(map: &TileMap) -> i32 {
    map.entries
        .iter()
        .map(|e| e.id)
        .chain(map.exits.iter().map(|e| e.id))
        .max()
        .map_or(0, |id| id + 1)
}

/// Whether a link between the two endpoints may be created
pub fn can_connect(maps: &[TileMap], begin: LinkEndpoint, end: LinkEndpoint) -> bool {
    if begin == end {
        return false;
    }
    [begin, end].iter().all(|p| {
        maps.get(p.tile_map_index).is_some_and(|map| {
            map.contains(p.x, p.y) && map.exit_at(p.x, p.y).is_none() && map.entry_at(p.x, p.y).is_none()
        })
    })
}

/// Fresh ids for the two sides of a new link
pub fn allocate_link_ids(maps: &[TileMap], begin: LinkEndpoint, end: LinkEndpoint) -> LinkIds {
    let begin_id = next_link_id(&maps[begin.tile_map_index]);
    let end_id = if begin.tile_map_index == end.tile_map_index {
        begin_id + 1
    } else {
        next_link_id(&maps[end.tile_map_index])
    };
    LinkIds {
        begin: begin_id,
        end: end_id,
    }
}

/// Allocate fresh ids for both sides and connect them
pub fn connect(maps: &mut [TileMap], begin: LinkEndpoint, end: LinkEndpoint) -> LinkIds {
    let ids = allocate_link_ids(maps, begin, end);
    connect_with_ids(maps, begin, end, ids);
    ids
}

/// Create both sides of a link using previously assigned ids
pub fn connect_with_ids(maps: &mut [TileMap], begin: LinkEndpoint, end: LinkEndpoint, ids: LinkIds) {
    add_side(&mut maps[begin.tile_map_index], begin, ids.begin, end.tile_map_index, ids.end);
    add_side(&mut maps[end.tile_map_index], end, ids.end, begin.tile_map_index, ids.begin);
}

fn add_side(map: &mut TileMap, at: LinkEndpoint, id: i32, target_map: usize, target_entry: i32) {
    map.entries.push(Entry {
        x: at.x,
        y: at.y,
        id,
    });
    map.exits.push(Exit {
        id,
        x: at.x,
        y: at.y,
        target_map_index: target_map as i32,
        target_entry_id: target_entry,
    });
}

/// Remove the entry and exit carrying `id` from one map
pub fn remove_link_side(maps: &mut [TileMap], tile_map_index: usize, id: i32) -> RemovedLinks {
    let map = &mut maps[tile_map_index];
    RemovedLinks {
        tile_map_index,
        entries: extract_where(&mut map.entries, |e| e.id == id),
        exits: extract_where(&mut map.exits, |e| e.id == id),
    }
}

/// Remove the seeded entries and exits together with everything that can no
/// longer stand without them:
///
/// - a removed exit takes its partner exit with it: the exit standing on the
///   entry it targets and pointing back at the entry under the removed exit
/// - an entry a removed exit targeted goes once no surviving exit targets it
/// - an exit whose target map or entry is missing is removed
///
/// The rules are applied until nothing changes, so the result never
/// contains a dangling reference. Seeds are `(map index, id)` pairs and are
/// always removed.
pub fn remove_links(
    maps: &mut [TileMap],
    dead_entries: HashSet<(usize, i32)>,
    dead_exits: HashSet<(usize, i32)>,
) -> Vec<RemovedLinks> {
    cascade_removal(maps, dead_entries, dead_exits, HashSet::new())
}

/// Remove every exit that points at a missing map or entry
pub fn remove_invalid_links(maps: &mut [TileMap]) -> Vec<RemovedLinks> {
    remove_links(maps, HashSet::new(), HashSet::new())
}

/// Remove the link that the exit with `exit_id` belongs to.
///
/// The exit and its partner exit always go. The entry under the exit and the
/// entry it targets go only when no other exit still leads to them, so doors
/// sharing a destination keep working.
pub fn sever_link(maps: &mut [TileMap], tile_map_index: usize, exit_id: i32) -> Vec<RemovedLinks> {
    let mut candidates = HashSet::new();
    if let Some(map) = maps.get(tile_map_index) {
        let under = map
            .exit_with_id(exit_id)
            .and_then(|i| map.entry_at(map.exits[i].x, map.exits[i].y));
        if let Some(i) = under {
            candidates.insert((tile_map_index, map.entries[i].id));
        }
    }
    cascade_removal(
        maps,
        HashSet::new(),
        HashSet::from([(tile_map_index, exit_id)]),
        candidates,
    )
}

fn target_of(maps: &[TileMap], exit: &Exit) -> Option<usize> {
    let t = usize::try_from(exit.target_map_index).ok()?;
    (t < maps.len()).then_some(t)
}

/// Id of the exit on the far side of a two-way link
fn partner_exit(maps: &[TileMap], m: usize, exit: &Exit) -> Option<i32> {
    let t = target_of(maps, exit)?;
    let own = &maps[m].entries[maps[m].entry_at(exit.x, exit.y)?];
    let target = &maps[t].entries[maps[t].entry_with_id(exit.target_entry_id)?];
    maps[t]
        .exits
        .iter()
        .find(|p| {
            p.x == target.x
                && p.y == target.y
                && p.target_map_index == m as i32
                && p.target_entry_id == own.id
        })
        .map(|p| p.id)
}

fn cascade_removal(
    maps: &mut [TileMap],
    mut dead_entries: HashSet<(usize, i32)>,
    mut dead_exits: HashSet<(usize, i32)>,
    mut candidates: HashSet<(usize, i32)>,
) -> Vec<RemovedLinks> {
    loop {
        let mut changed = false;

        for (m, map) in maps.iter().enumerate() {
            for exit in &map.exits {
                let target = target_of(maps, exit);

                if dead_exits.contains(&(m, exit.id)) {
                    if let Some(t) = target {
                        changed |= candidates.insert((t, exit.target_entry_id));
                    }
                    if let Some(partner) = partner_exit(maps, m, exit) {
                        changed |= dead_exits.insert((exit.target_map_index as usize, partner));
                    }
                    continue;
                }

                let target_alive = target.is_some_and(|t| {
                    !dead_entries.contains(&(t, exit.target_entry_id))
                        && maps[t].entry_with_id(exit.target_entry_id).is_some()
                });
                if !target_alive {
                    dead_exits.insert((m, exit.id));
                    changed = true;
                }
            }
        }

        for &(t, id) in &candidates {
            if dead_entries.contains(&(t, id)) {
                continue;
            }
            let still_targeted = maps.iter().enumerate().any(|(m, map)| {
                map.exits.iter().any(|e| {
                    e.target_map_index == t as i32
                        && e.target_entry_id == id
                        && !dead_exits.contains(&(m, e.id))
                })
            });
            if !still_targeted {
                dead_entries.insert((t, id));
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    let mut removed = Vec::new();
    for (m, map) in maps.iter_mut().enumerate() {
        let record = RemovedLinks {
            tile_map_index: m,
            entries: extract_where(&mut map.entries, |e| dead_entries.contains(&(m, e.id))),
            exits: extract_where(&mut map.exits, |e| dead_exits.contains(&(m, e.id))),
        };
        if !record.is_empty() {
            removed.push(record);
        }
    }
    if !removed.is_empty() {
        log::debug!(
            "Removed links: {} entries, {} exits",
            removed.iter().map(|r| r.entries.len()).sum::<usize>(),
            removed.iter().map(|r| r.exits.len()).sum::<usize>()
        );
    }
    removed
}

/// Put back records captured by [`remove_links`] at their original positions
pub fn restore_links(maps: &mut [TileMap], removed: &[RemovedLinks]) {
    for record in removed {
        let map = &mut maps[record.tile_map_index];
        reinsert_sorted(&mut map.entries, &record.entries);
        reinsert_sorted(&mut map.exits, &record.exits);
    }
}

/// Exits that reference a missing map or entry
pub fn dangling_exits(maps: &[TileMap]) -> Vec<(usize, i32)> {
    let mut dangling = Vec::new();
    for (m, map) in maps.iter().enumerate() {
        for exit in &map.exits {
            let t = exit.target_map_index;
            let ok = t >= 0
                && maps
                    .get(t as usize)
                    .is_some_and(|target| target.entry_with_id(exit.target_entry_id).is_some());
            if !ok {
                dangling.push((m, exit.id));
            }
        }
    }
    dangling
}
