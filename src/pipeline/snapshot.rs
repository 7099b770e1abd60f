use crate::foundation::core::{GridGeometry, TileId};
use crate::foundation::error::{PixelmapError, PixelmapResult};
use crate::tile::code::TileCode;

/// Last-seen code for every tile cell, owned by a single render pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileSnapshotTable {
    codes: Vec<TileCode>,
}

impl TileSnapshotTable {
    /// All cells blank.
    pub fn blank(geometry: GridGeometry) -> Self {
        Self {
            codes: vec![TileCode::blank(); geometry.tile_count() as usize],
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn get(&self, tile: TileId) -> Option<&TileCode> {
        self.codes.get(tile.0 as usize)
    }

    pub fn set(&mut self, tile: TileId, code: TileCode) -> PixelmapResult<()> {
        let len = self.codes.len();
        let slot = self.codes.get_mut(tile.0 as usize).ok_or_else(|| {
            PixelmapError::validation(format!("tile {tile} outside grid of {len} tiles"))
        })?;
        *slot = code;
        Ok(())
    }

    /// Cells holding a non-blank code, in tile id order.
    pub fn painted(&self) -> impl Iterator<Item = (TileId, &TileCode)> {
        self.codes
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_blank())
            .map(|(i, c)| (TileId(i as u32), c))
    }
}

/// Outcome of running one change through [`ChangeDedupFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// New code for the tile; the table has been updated and the tile must be rendered.
    Changed,
    /// Same code as last seen; rendering would produce identical files.
    Unchanged,
}

/// Suppresses re-renders of tiles whose code did not change within the current pass.
#[derive(Clone, Debug)]
pub struct ChangeDedupFilter {
    table: TileSnapshotTable,
}

impl ChangeDedupFilter {
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            table: TileSnapshotTable::blank(geometry),
        }
    }

    /// Record an already-rendered code without classifying it.
    pub fn seed(&mut self, tile: TileId, code: &TileCode) -> PixelmapResult<()> {
        self.table.set(tile, code.clone())
    }

    pub fn classify(&mut self, tile: TileId, code: &TileCode) -> PixelmapResult<Classification> {
        let Some(seen) = self.table.get(tile) else {
            return Err(PixelmapError::validation(format!(
                "tile {tile} outside grid of {} tiles",
                self.table.len()
            )));
        };
        if seen == code {
            return Ok(Classification::Unchanged);
        }
        self.table.set(tile, code.clone())?;
        Ok(Classification::Changed)
    }

    pub fn table(&self) -> &TileSnapshotTable {
        &self.table
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/snapshot.rs"]
mod tests;
