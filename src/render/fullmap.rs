use image::{DynamicImage, Rgba, RgbaImage};

use crate::encode::layout::OutputLayout;
use crate::encode::sink::ImageSink;
use crate::foundation::core::GridGeometry;
use crate::foundation::error::PixelmapResult;
use crate::pipeline::snapshot::TileSnapshotTable;
use crate::tile::code::decode_tile_code;

/// Color of cells with no renderable code.
pub const BLANK_CELL: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Lay every tile out at native resolution in row-major grid order.
///
/// Blank and undecodable cells stay [`BLANK_CELL`] (fully transparent); painted pixels are opaque.
pub fn compose_full_map(table: &TileSnapshotTable, geometry: GridGeometry) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(
        geometry.full_map_width(),
        geometry.full_map_height(),
        BLANK_CELL,
    );

    for (tile, code) in table.painted() {
        let Some((ox, oy)) = geometry.cell_origin(tile) else {
            continue;
        };
        let Ok(raster) = decode_tile_code(code, geometry) else {
            continue;
        };
        for y in 0..raster.height() {
            for x in 0..raster.width() {
                if let Some(px) = raster.pixel(x, y) {
                    canvas.put_pixel(ox + x, oy + y, Rgba([px.r, px.g, px.b, 255]));
                }
            }
        }
    }

    canvas
}

/// Compose the map and write the block-keyed snapshot and `fullMap.png`.
pub fn render_full_map(
    sink: &mut dyn ImageSink,
    geometry: GridGeometry,
    block_number: u64,
    table: &TileSnapshotTable,
) -> PixelmapResult<()> {
    let img = DynamicImage::ImageRgba8(compose_full_map(table, geometry));
    sink.write(&OutputLayout::full_map_history(block_number), &img)?;
    sink.write(&OutputLayout::full_map_latest(), &img)?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/fullmap.rs"]
mod tests;
