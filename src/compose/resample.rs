use crate::foundation::error::{RepackError, RepackResult};

/// Integer nearest-neighbor mapping from destination pixel coordinates to source pixel
/// coordinates.
///
/// `src = clamp(dst * src_size / dst_size, 0, src_size - 1)` per axis. No interpolation, and
/// the result is always inside the source bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resampler {
    dst_width: u32,
    dst_height: u32,
    src_width: u32,
    src_height: u32,
}

impl Resampler {
    /// Build a mapping from a `dst` sized grid onto a `src` sized image.
    pub fn new(dst: (u32, u32), src: (u32, u32)) -> RepackResult<Self> {
        if dst.0 == 0 || dst.1 == 0 {
            return Err(RepackError::dimension(format!(
                "destination size must be non-zero, got {}x{}",
                dst.0, dst.1
            )));
        }
        if src.0 == 0 || src.1 == 0 {
            return Err(RepackError::dimension(format!(
                "source size must be non-zero, got {}x{}",
                src.0, src.1
            )));
        }
        Ok(Self {
            dst_width: dst.0,
            dst_height: dst.1,
            src_width: src.0,
            src_height: src.1,
        })
    }

    /// Source column for destination column `x`.
    #[inline]
    pub fn map_x(&self, x: u32) -> u32 {
        map_axis(x, self.dst_width, self.src_width)
    }

    /// Source row for destination row `y`.
    #[inline]
    pub fn map_y(&self, y: u32) -> u32 {
        map_axis(y, self.dst_height, self.src_height)
    }

    /// Source coordinate for destination coordinate `(x, y)`.
    #[inline]
    pub fn map(&self, x: u32, y: u32) -> (u32, u32) {
        (self.map_x(x), self.map_y(y))
    }

    /// Precomputed source column for every destination column.
    pub fn column_map(&self) -> Vec<u32> {
        (0..self.dst_width).map(|x| self.map_x(x)).collect()
    }

    /// Return `true` when source and destination sizes match (mapping is the identity).
    pub fn is_identity(&self) -> bool {
        self.dst_width == self.src_width && self.dst_height == self.src_height
    }
}

#[inline]
fn map_axis(d: u32, dst_len: u32, src_len: u32) -> u32 {
    let s = u64::from(d) * u64::from(src_len) / u64::from(dst_len);
    s.min(u64::from(src_len - 1)) as u32
}

#[cfg(test)]
#[path = "../../tests/unit/compose/resample.rs"]
mod tests;
