use serde::{Deserialize, Serialize};

use crate::foundation::core::{GridGeometry, Rgb8};
use crate::tile::raster::TileRaster;

/// Compact textual tile encoding: three hex digits per pixel, row-major.
///
/// Each digit is a half-byte channel value that expands to a full byte by repetition, so `"f80"`
/// means `#ff8800`. The empty string marks a tile that was never painted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileCode(String);

impl TileCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn blank() -> Self {
        Self(String::new())
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Same checks as [`decode_tile_code`], without building a raster.
    pub fn validate(&self, geometry: GridGeometry) -> Result<(), TileCodeError> {
        check_len(self.as_str(), geometry)?;
        match self.0.bytes().position(|b| nibble(b).is_none()) {
            Some(index) => Err(TileCodeError::InvalidDigit {
                index,
                byte: self.0.as_bytes()[index],
            }),
            None => Ok(()),
        }
    }

    pub fn is_renderable(&self, geometry: GridGeometry) -> bool {
        self.validate(geometry).is_ok()
    }
}

impl From<&str> for TileCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TileCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Reasons a tile code is refused. Refusal is an expected state (unpainted tiles), not a failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TileCodeError {
    #[error("tile code has length {len}, expected {expected}")]
    WrongLength { len: usize, expected: usize },

    #[error("tile code has non-hex byte {byte:#04x} at offset {index}")]
    InvalidDigit { index: usize, byte: u8 },
}

/// Decode a tile code into a `tile_size x tile_size` raster.
pub fn decode_tile_code(
    code: &TileCode,
    geometry: GridGeometry,
) -> Result<TileRaster, TileCodeError> {
    let raw = code.as_str();
    check_len(raw, geometry)?;

    let mut pixels = Vec::with_capacity(geometry.pixels_per_tile());
    for (group_idx, group) in raw.as_bytes().chunks_exact(3).enumerate() {
        let mut channels = [0u8; 3];
        for (c, &b) in group.iter().enumerate() {
            let n = nibble(b).ok_or(TileCodeError::InvalidDigit {
                index: group_idx * 3 + c,
                byte: b,
            })?;
            // "c" -> "cc": the digit fills both halves of the byte.
            channels[c] = (n << 4) | n;
        }
        pixels.push(Rgb8::new(channels[0], channels[1], channels[2]));
    }

    Ok(TileRaster::from_pixels(
        geometry.tile_size,
        geometry.tile_size,
        pixels,
    ))
}

/// Encode a raster back to the compact form. Channel low nibbles are dropped.
pub fn encode_tile_code(raster: &TileRaster) -> TileCode {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(raster.pixels().len() * 3);
    for px in raster.pixels() {
        for v in px.to_array() {
            out.push(HEX[(v >> 4) as usize] as char);
        }
    }
    TileCode(out)
}

fn check_len(raw: &str, geometry: GridGeometry) -> Result<(), TileCodeError> {
    let expected = geometry.code_len();
    if raw.len() != expected {
        return Err(TileCodeError::WrongLength {
            len: raw.len(),
            expected,
        });
    }
    Ok(())
}

fn nibble(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
#[path = "../../tests/unit/tile/code.rs"]
mod tests;
