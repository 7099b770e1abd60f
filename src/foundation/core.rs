use serde::{Deserialize, Serialize};

use crate::foundation::error::{PixelmapError, PixelmapResult};

/// Index of a tile cell in the grid, row-major from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u32);

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Straight (non-premultiplied) RGB8 pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Grid and tile dimensions every stage of the pipeline agrees on.
///
/// The deployed map is 63x63 tiles of 16x16 pixels, upscaled to 512x512 per tile image. Tile ids
/// run over `[0, tile_count)`, which may exceed the `grid_width x grid_height` cells: the deployed
/// map has 3970 ids, and id 3969 lands in an extra row below the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridGeometry {
    pub grid_width: u32,
    pub grid_height: u32,
    pub tile_size: u32,
    pub tile_output_size: u32,
    tile_count: u32,
}

impl GridGeometry {
    pub fn new(
        grid_width: u32,
        grid_height: u32,
        tile_size: u32,
        tile_output_size: u32,
    ) -> PixelmapResult<Self> {
        if grid_width == 0 || grid_height == 0 {
            return Err(PixelmapError::validation("grid dimensions must be > 0"));
        }
        if tile_size == 0 {
            return Err(PixelmapError::validation("tile_size must be > 0"));
        }
        if tile_output_size < tile_size || tile_output_size % tile_size != 0 {
            return Err(PixelmapError::validation(format!(
                "tile_output_size {tile_output_size} must be a positive multiple of tile_size {tile_size}"
            )));
        }
        grid_width
            .checked_mul(grid_height)
            .ok_or_else(|| PixelmapError::validation("grid tile count overflows u32"))?;
        grid_width
            .checked_mul(tile_size)
            .zip(grid_height.checked_mul(tile_size))
            .ok_or_else(|| PixelmapError::validation("full map dimensions overflow u32"))?;
        Ok(Self {
            grid_width,
            grid_height,
            tile_size,
            tile_output_size,
            tile_count: grid_width * grid_height,
        })
    }

    /// Widen the tile id range to `[0, tile_count)`. Must cover at least every grid cell.
    pub fn with_tile_count(mut self, tile_count: u32) -> PixelmapResult<Self> {
        let cells = self.grid_width * self.grid_height;
        if tile_count < cells {
            return Err(PixelmapError::validation(format!(
                "tile_count {tile_count} is smaller than the {cells} grid cells"
            )));
        }
        self.tile_count = tile_count;
        self.map_rows()
            .checked_mul(self.tile_size)
            .ok_or_else(|| PixelmapError::validation("full map height overflows u32"))?;
        Ok(self)
    }

    /// Number of valid tile ids.
    pub fn tile_count(self) -> u32 {
        self.tile_count
    }

    /// Tile rows in the full map: the grid rows plus any rows needed for ids past the last cell.
    pub fn map_rows(self) -> u32 {
        self.tile_count.div_ceil(self.grid_width).max(self.grid_height)
    }

    pub fn pixels_per_tile(self) -> usize {
        (self.tile_size as usize) * (self.tile_size as usize)
    }

    /// Exact length a renderable tile code must have.
    pub fn code_len(self) -> usize {
        3 * self.pixels_per_tile()
    }

    /// Output pixels per source pixel along each axis.
    pub fn scale(self) -> u32 {
        self.tile_output_size / self.tile_size
    }

    pub fn full_map_width(self) -> u32 {
        self.grid_width * self.tile_size
    }

    pub fn full_map_height(self) -> u32 {
        self.map_rows() * self.tile_size
    }

    pub fn contains(self, tile: TileId) -> bool {
        tile.0 < self.tile_count()
    }

    /// Top-left pixel of a tile's cell in the full map, or `None` for ids past `tile_count`.
    pub fn cell_origin(self, tile: TileId) -> Option<(u32, u32)> {
        if !self.contains(tile) {
            return None;
        }
        let col = tile.0 % self.grid_width;
        let row = tile.0 / self.grid_width;
        Some((col * self.tile_size, row * self.tile_size))
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            grid_width: 63,
            grid_height: 63,
            tile_size: 16,
            tile_output_size: 512,
            tile_count: 3970,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
