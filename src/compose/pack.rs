use crate::{
    assets::cache::{PixelCache, PixelSnapshot},
    assets::handle::ImageHandle,
    compose::channel::{apply_invert, sample},
    compose::resample::Resampler,
    compose::rows::RowDriver,
    foundation::core::{Channel, PixelBuffer},
    foundation::error::{RepackError, RepackResult},
};

/// Side length of the square pack/blend preview.
pub const PREVIEW_SIZE: u32 = 128;

/// Export size used when no slot is bound to an image.
pub const FALLBACK_EXPORT_SIZE: (u32, u32) = (512, 512);

/// Configuration of one output channel of a packed image.
#[derive(Clone, Debug)]
pub struct ChannelSlot {
    /// Image to sample; `None` means nothing is bound.
    pub source: Option<ImageHandle>,
    /// Which channel of `source` to read.
    pub channel: Channel,
    /// Apply `1 - v` after sampling (or to the constant).
    pub invert: bool,
    /// Ignore `source` and use `custom_value` everywhere.
    pub use_custom: bool,
    /// Constant used when `use_custom` is set, in `[0, 1]`.
    pub custom_value: f32,
}

impl Default for ChannelSlot {
    fn default() -> Self {
        Self {
            source: None,
            channel: Channel::R,
            invert: false,
            use_custom: false,
            custom_value: 0.5,
        }
    }
}

impl ChannelSlot {
    /// Unbound slot for `output` that reads the same channel once an image is bound.
    pub fn unbound(output: Channel) -> Self {
        Self {
            channel: output,
            ..Self::default()
        }
    }

    /// Slot sampling `channel` of `source`.
    pub fn image(source: ImageHandle, channel: Channel) -> Self {
        Self {
            source: Some(source),
            channel,
            ..Self::default()
        }
    }

    /// Slot producing a constant value.
    pub fn constant(value: f32) -> Self {
        Self {
            use_custom: true,
            custom_value: value,
            ..Self::default()
        }
    }

    /// Same slot with inversion enabled.
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// The handle this slot will actually sample, if any.
    pub fn bound_source(&self) -> Option<&ImageHandle> {
        if self.use_custom {
            None
        } else {
            self.source.as_ref()
        }
    }

    /// Value used for every pixel of `output` when nothing is sampled from an image.
    ///
    /// Custom constants honor `invert`; unbound slots fall back to 0, or 1 for alpha so
    /// packed images are opaque by default.
    pub fn fallback_value(&self, output: Channel) -> f32 {
        if self.use_custom {
            apply_invert(self.custom_value, self.invert)
        } else {
            default_channel_value(output)
        }
    }
}

/// Channel-default policy for unbound pack slots.
pub fn default_channel_value(output: Channel) -> f32 {
    if output == Channel::A { 1.0 } else { 0.0 }
}

/// A pack slot with its image (if any) already decoded.
#[derive(Clone, Debug)]
pub enum PackSource {
    /// Constant scalar for every pixel.
    Constant(f32),
    /// Sample one channel of decoded pixels through the resampler.
    Image {
        /// Decoded source pixels.
        pixels: PixelBuffer,
        /// Channel to read.
        channel: Channel,
        /// Apply `1 - v` after sampling.
        invert: bool,
    },
}

impl PackSource {
    /// Resolve `slot` feeding output channel `output`, decoding through `cache`.
    ///
    /// Returns the cache snapshot alongside so callers can detect invalidation.
    pub fn resolve(
        slot: &ChannelSlot,
        output: Channel,
        cache: &PixelCache,
    ) -> RepackResult<(Self, Option<PixelSnapshot>)> {
        match slot.bound_source() {
            None => Ok((Self::Constant(slot.fallback_value(output)), None)),
            Some(handle) => {
                let snap = cache.snapshot(handle)?;
                let source = Self::Image {
                    pixels: snap.pixels.clone(),
                    channel: slot.channel,
                    invert: slot.invert,
                };
                Ok((source, Some(snap)))
            }
        }
    }

    /// Like [`PackSource::resolve`] but a failed decode degrades to the channel default.
    pub fn resolve_or_default(slot: &ChannelSlot, output: Channel, cache: &PixelCache) -> Self {
        match Self::resolve(slot, output, cache) {
            Ok((source, _)) => source,
            Err(e) => {
                tracing::warn!(
                    channel = output.label(),
                    error = %e,
                    "preview slot failed to decode, using channel default"
                );
                Self::Constant(default_channel_value(output))
            }
        }
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Self::Constant(_) => None,
            Self::Image { pixels, .. } => Some(pixels.dimensions()),
        }
    }
}

/// Export size for a set of resolved sources: the largest width and the largest height
/// among image-backed sources, or `fallback` when every slot is constant.
pub fn export_size(sources: &[PackSource; 4], fallback: (u32, u32)) -> (u32, u32) {
    let mut size: Option<(u32, u32)> = None;
    for (w, h) in sources.iter().filter_map(PackSource::dimensions) {
        size = Some(match size {
            None => (w, h),
            Some((mw, mh)) => (mw.max(w), mh.max(h)),
        });
    }
    size.unwrap_or(fallback)
}

enum ChannelPlan<'a> {
    Constant(f32),
    Image {
        pixels: &'a PixelBuffer,
        resampler: Resampler,
        columns: Vec<u32>,
        channel: Channel,
        invert: bool,
    },
}

/// Synthesize a `width x height` RGBA image from four independent channel sources.
///
/// Output channel `i` comes from `sources[i]`; image sources are sampled with nearest
/// neighbor mapping from the destination onto their own size.
pub fn pack_channels(
    sources: &[PackSource; 4],
    width: u32,
    height: u32,
) -> RepackResult<PixelBuffer> {
    pack_with(sources, width, height, &mut RowDriver::sequential())
}

#[tracing::instrument(skip(sources, driver))]
pub(crate) fn pack_with(
    sources: &[PackSource; 4],
    width: u32,
    height: u32,
    driver: &mut RowDriver<'_>,
) -> RepackResult<PixelBuffer> {
    if width == 0 || height == 0 {
        return Err(RepackError::dimension(format!(
            "pack destination must be non-zero, got {width}x{height}"
        )));
    }

    let mut plans = Vec::with_capacity(4);
    for source in sources {
        plans.push(match source {
            PackSource::Constant(v) => ChannelPlan::Constant(*v),
            PackSource::Image {
                pixels,
                channel,
                invert,
            } => {
                let resampler = Resampler::new((width, height), pixels.dimensions())?;
                ChannelPlan::Image {
                    pixels,
                    columns: resampler.column_map(),
                    resampler,
                    channel: *channel,
                    invert: *invert,
                }
            }
        });
    }

    driver.run(width, height, |y, row| {
        for (c, plan) in plans.iter().enumerate() {
            match plan {
                ChannelPlan::Constant(v) => {
                    for px in row.chunks_exact_mut(4) {
                        px[c] = *v;
                    }
                }
                ChannelPlan::Image {
                    pixels,
                    resampler,
                    columns,
                    channel,
                    invert,
                } => {
                    let sy = resampler.map_y(y);
                    for (px, &sx) in row.chunks_exact_mut(4).zip(columns) {
                        px[c] = sample(pixels, sx, sy, *channel, *invert);
                    }
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compose/pack.rs"]
mod tests;
