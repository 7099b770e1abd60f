use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::GridGeometry;
use crate::foundation::error::{PixelmapError, PixelmapResult};

/// Cursor store key the renderer checkpoints its progress under.
pub const DEFAULT_CURSOR_KEY: &str = "renderer_last_processed_data_change";

/// Renderer settings, loaded from JSON. Every field has a default matching the deployed map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    /// Tiles per grid row.
    pub grid_width: u32,
    /// Tile rows in the grid.
    pub grid_height: u32,
    /// Source pixels per tile edge.
    pub tile_size: u32,
    /// Pixels per edge of each upscaled tile image.
    pub tile_output_size: u32,
    /// Number of valid tile ids; at least `grid_width * grid_height`.
    pub tile_count: u32,
    /// Key used against the cursor store.
    pub cursor_key: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        let g = GridGeometry::default();
        Self {
            grid_width: g.grid_width,
            grid_height: g.grid_height,
            tile_size: g.tile_size,
            tile_output_size: g.tile_output_size,
            tile_count: g.tile_count(),
            cursor_key: DEFAULT_CURSOR_KEY.to_string(),
        }
    }
}

impl RendererConfig {
    /// Read a JSON config file. `None` yields the defaults.
    pub fn load(path: Option<&Path>) -> PixelmapResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&raw)
            .map_err(|e| PixelmapError::serde(format!("config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> PixelmapResult<()> {
        if self.cursor_key.trim().is_empty() {
            return Err(PixelmapError::validation("cursor_key must not be empty"));
        }
        self.geometry().map(|_| ())
    }

    pub fn geometry(&self) -> PixelmapResult<GridGeometry> {
        GridGeometry::new(
            self.grid_width,
            self.grid_height,
            self.tile_size,
            self.tile_output_size,
        )?
        .with_tile_count(self.tile_count)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
