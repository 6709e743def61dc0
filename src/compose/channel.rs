use crate::foundation::core::{Channel, PixelBuffer, Rgba};
use crate::foundation::error::{RepackError, RepackResult};

/// Read one channel of the pixel at `(x, y)`, optionally inverted as `1 - v`.
#[inline]
pub fn sample(buffer: &PixelBuffer, x: u32, y: u32, channel: Channel, invert: bool) -> f32 {
    apply_invert(buffer.pixel(x, y)[channel.index()], invert)
}

#[inline]
pub(crate) fn apply_invert(v: f32, invert: bool) -> f32 {
    if invert { 1.0 - v } else { v }
}

/// Channel isolation applied to a whole pixel before blending or display.
///
/// Serialized as the integer selector used by job files: `-1` for all channels, `0..=3` for
/// R, G, B, A.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum ChannelSelect {
    /// Pass the RGBA pixel through unchanged.
    #[default]
    All,
    /// Broadcast one channel to R, G and B and force alpha to 1.
    Isolate(Channel),
}

impl ChannelSelect {
    /// Parse an integer selector (`-1` = all, `0..=3` = R/G/B/A).
    pub fn from_selector(selector: i32) -> RepackResult<Self> {
        match selector {
            -1 => Ok(Self::All),
            0..=3 => Channel::from_index(selector as usize)
                .map(Self::Isolate)
                .ok_or_else(|| RepackError::validation("channel selector out of range")),
            other => Err(RepackError::validation(format!(
                "channel selector must be -1..=3, got {other}"
            ))),
        }
    }

    /// Integer selector for this value.
    pub fn selector(self) -> i32 {
        match self {
            Self::All => -1,
            Self::Isolate(c) => c.index() as i32,
        }
    }

    /// Apply the isolation to one pixel.
    #[inline]
    pub fn apply(self, px: Rgba) -> Rgba {
        match self {
            Self::All => px,
            Self::Isolate(c) => {
                let v = px[c.index()];
                [v, v, v, 1.0]
            }
        }
    }

    /// Apply the isolation to every pixel of `buffer`. `All` returns a cheap clone.
    pub fn apply_buffer(self, buffer: &PixelBuffer) -> RepackResult<PixelBuffer> {
        if self == Self::All {
            return Ok(buffer.clone());
        }
        let data = buffer.pixels().flat_map(|px| self.apply(px)).collect();
        PixelBuffer::from_rgba(buffer.width(), buffer.height(), data)
    }
}

impl TryFrom<i32> for ChannelSelect {
    type Error = RepackError;

    fn try_from(selector: i32) -> Result<Self, Self::Error> {
        Self::from_selector(selector)
    }
}

impl From<ChannelSelect> for i32 {
    fn from(select: ChannelSelect) -> Self {
        select.selector()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/channel.rs"]
mod tests;
