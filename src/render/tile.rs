use image::{DynamicImage, RgbImage};

use crate::encode::layout::OutputLayout;
use crate::encode::sink::ImageSink;
use crate::foundation::core::{GridGeometry, TileId};
use crate::foundation::error::{PixelmapError, PixelmapResult};
use crate::tile::raster::TileRaster;

/// Nearest-neighbour upscale to a `target x target` image.
///
/// Each source pixel becomes a solid `(target / width) x (target / height)` block; no blending.
pub fn upscale_nearest(raster: &TileRaster, target: u32) -> PixelmapResult<RgbImage> {
    let (w, h) = (raster.width(), raster.height());
    if w == 0 || h == 0 || target % w != 0 || target % h != 0 {
        return Err(PixelmapError::validation(format!(
            "cannot upscale {w}x{h} raster to {target}x{target} without resampling"
        )));
    }
    let (sx, sy) = (target / w, target / h);
    let src = raster.to_rgb_image();
    Ok(RgbImage::from_fn(target, target, |x, y| {
        *src.get_pixel(x / sx, y / sy)
    }))
}

/// Upscale a tile and write its block-keyed archive copy and its `latest` copy.
pub fn render_tile(
    sink: &mut dyn ImageSink,
    geometry: GridGeometry,
    tile: TileId,
    block_number: u64,
    raster: &TileRaster,
) -> PixelmapResult<()> {
    let img = DynamicImage::ImageRgb8(upscale_nearest(raster, geometry.tile_output_size)?);
    sink.write(&OutputLayout::tile_history(tile, block_number), &img)?;
    sink.write(&OutputLayout::tile_latest(tile), &img)?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/tile.rs"]
mod tests;
