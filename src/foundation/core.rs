use std::sync::Arc;

use crate::foundation::error::{RepackError, RepackResult};
use crate::foundation::math::{u8_to_unit, unit_to_u8};

/// One scalar component of an RGBA pixel.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Red.
    #[serde(alias = "R")]
    R,
    /// Green.
    #[serde(alias = "G")]
    G,
    /// Blue.
    #[serde(alias = "B")]
    B,
    /// Alpha.
    #[serde(alias = "A")]
    A,
}

impl Channel {
    /// All channels in storage order.
    pub const ALL: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::A];

    /// Storage index of this channel inside an RGBA pixel.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`Channel::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Single-letter uppercase label (`"R"`, `"G"`, ...).
    pub fn label(self) -> &'static str {
        match self {
            Channel::R => "R",
            Channel::G => "G",
            Channel::B => "B",
            Channel::A => "A",
        }
    }
}

/// One RGBA pixel of unit scalars.
pub type Rgba = [f32; 4];

/// Immutable row-major RGBA image of scalars in `[0, 1]`.
///
/// Pixel data sits behind an `Arc`, so clones share storage. This is what lets the
/// pixel cache hand the same decoded buffer to pack, unpack, blend and preview without
/// copying.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Arc<Vec<f32>>,
}

impl PixelBuffer {
    /// Wrap interleaved RGBA scalars. `data.len()` must equal `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<f32>) -> RepackResult<Self> {
        let expected = pixel_count(width, height)?
            .checked_mul(4)
            .ok_or_else(|| RepackError::dimension("pixel buffer size overflow"))?;
        if data.len() != expected {
            return Err(RepackError::dimension(format!(
                "pixel buffer for {width}x{height} expects {expected} scalars, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data: Arc::new(data),
        })
    }

    /// Build a buffer filled with a single color.
    pub fn solid(width: u32, height: u32, rgba: Rgba) -> RepackResult<Self> {
        let n = pixel_count(width, height)?;
        let mut data = Vec::with_capacity(n * 4);
        for _ in 0..n {
            data.extend_from_slice(&rgba);
        }
        Self::from_rgba(width, height, data)
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel in row-major order.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> Rgba,
    ) -> RepackResult<Self> {
        let n = pixel_count(width, height)?;
        let mut data = Vec::with_capacity(n * 4);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::from_rgba(width, height, data)
    }

    /// Convert tightly packed straight-alpha RGBA8 into unit scalars.
    pub fn from_rgba8(width: u32, height: u32, rgba8: &[u8]) -> RepackResult<Self> {
        let expected = pixel_count(width, height)?
            .checked_mul(4)
            .ok_or_else(|| RepackError::dimension("pixel buffer size overflow"))?;
        if rgba8.len() != expected {
            return Err(RepackError::dimension(format!(
                "rgba8 data for {width}x{height} expects {expected} bytes, got {}",
                rgba8.len()
            )));
        }
        let data = rgba8.iter().copied().map(u8_to_unit).collect();
        Self::from_rgba(width, height, data)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Read the pixel at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Interleaved RGBA scalars, row-major.
    pub fn as_slice(&self) -> &[f32] {
        self.data.as_slice()
    }

    /// Iterate pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Rgba> + '_ {
        self.data
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// Return `true` when both buffers share the same backing allocation.
    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Encode as straight-alpha RGBA8.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.data.iter().copied().map(unit_to_u8).collect()
    }

    /// Encode as RGB8, dropping alpha.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() / 4 * 3);
        for px in self.data.chunks_exact(4) {
            out.push(unit_to_u8(px[0]));
            out.push(unit_to_u8(px[1]));
            out.push(unit_to_u8(px[2]));
        }
        out
    }
}

/// Number of pixels in a `width x height` image; zero-area images are rejected.
pub(crate) fn pixel_count(width: u32, height: u32) -> RepackResult<usize> {
    if width == 0 || height == 0 {
        return Err(RepackError::dimension(format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| RepackError::dimension("pixel count overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
