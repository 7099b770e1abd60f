use std::path::PathBuf;

use crate::foundation::core::TileId;

const FULL_MAP_DIR: &str = "fullmap";
const FULL_MAP_LATEST: &str = "fullMap.png";
const TILE_LATEST: &str = "latest.png";

/// Relative output paths consumed by downstream readers.
///
/// Every render writes a block-keyed archive copy plus a mutable "latest" copy.
#[derive(Clone, Copy, Debug, Default)]
pub struct OutputLayout;

impl OutputLayout {
    /// `<tile>/<block>.png`
    pub fn tile_history(tile: TileId, block: u64) -> PathBuf {
        PathBuf::from(tile.to_string()).join(format!("{block}.png"))
    }

    /// `<tile>/latest.png`
    pub fn tile_latest(tile: TileId) -> PathBuf {
        PathBuf::from(tile.to_string()).join(TILE_LATEST)
    }

    /// `fullmap/<block>.png`
    pub fn full_map_history(block: u64) -> PathBuf {
        PathBuf::from(FULL_MAP_DIR).join(format!("{block}.png"))
    }

    /// `fullmap/fullMap.png`
    pub fn full_map_latest() -> PathBuf {
        PathBuf::from(FULL_MAP_DIR).join(FULL_MAP_LATEST)
    }
}
