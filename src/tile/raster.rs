use image::RgbImage;

use crate::foundation::core::Rgb8;

/// Immutable row-major RGB raster of one tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileRaster {
    width: u32,
    height: u32,
    pixels: Vec<Rgb8>,
}

impl TileRaster {
    /// Panics if `pixels.len() != width * height`; decoders size the buffer from the same geometry.
    pub(crate) fn from_pixels(width: u32, height: u32, pixels: Vec<Rgb8>) -> Self {
        assert_eq!(pixels.len(), (width as usize) * (height as usize));
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn solid(width: u32, height: u32, color: Rgb8) -> Self {
        Self::from_pixels(
            width,
            height,
            vec![color; (width as usize) * (height as usize)],
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgb8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get((y as usize) * (self.width as usize) + x as usize)
            .copied()
    }

    /// Copy into an `image` buffer at native resolution.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let px = self.pixels[(y as usize) * (self.width as usize) + x as usize];
            image::Rgb(px.to_array())
        })
    }
}
