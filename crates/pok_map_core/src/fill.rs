//! Flood fill (bucket) region search

use crate::TileMap;

impl TileMap {
    /// Cells of layer `z` reachable from `(x, y)` through 4-connected
    /// neighbours holding the same tile id as the seed.
    ///
    /// Texture index and collision are ignored. Returns an empty list when
    /// the seed is outside the map or layer.
    pub fn flood_region(&self, z: usize, x: i32, y: i32) -> Vec<usize> {
        let Some(seed) = self.index_of(x, y) else {
            return Vec::new();
        };
        let Some(layer) = self.tiles.get(z) else {
            return Vec::new();
        };
        let target = layer[seed];

        let mut region = Vec::new();
        let mut visited = vec![false; layer.len()];
        let mut stack = vec![(x, y)];

        while let Some((x, y)) = stack.pop() {
            let Some(index) = self.index_of(x, y) else {
                continue;
            };
            if visited[index] {
                continue;
            }
            visited[index] = true;

            if layer[index] != target {
                continue;
            }
            region.push(index);

            stack.push((x - 1, y));
            stack.push((x + 1, y));
            stack.push((x, y - 1));
            stack.push((x, y + 1));
        }

        region.sort_unstable();
        region
    }
}
