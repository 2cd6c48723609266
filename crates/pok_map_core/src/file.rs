//! Map file save/load operations

use crate::{MapError, TileMap};
use std::path::Path;

impl TileMap {
    /// Parse and validate a map from JSON text
    pub fn from_json_str(content: &str) -> Result<Self, MapError> {
        let map: TileMap = serde_json::from_str(content)?;
        map.validate()?;
        Ok(map)
    }

    /// Serialize the map as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String, MapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a map from file
    pub fn load(path: &Path) -> Result<Self, MapError> {
        let content = std::fs::read_to_string(path)?;
        let map = Self::from_json_str(&content)?;
        log::info!(
            "Loaded map {:?} ({}x{}, {} layers)",
            path,
            map.width,
            map.height,
            map.layer_count()
        );
        Ok(map)
    }

    /// Save map to file
    pub fn save(&self, path: &Path) -> Result<(), MapError> {
        self.validate()?;
        let content = self.to_json_string()?;
        std::fs::write(path, content)?;
        log::info!("Saved map {:?}", path);
        Ok(())
    }
}
