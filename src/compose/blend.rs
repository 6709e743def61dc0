use crate::{
    assets::handle::ImageHandle,
    compose::channel::ChannelSelect,
    compose::resample::Resampler,
    compose::rows::RowDriver,
    foundation::core::{PixelBuffer, Rgba},
    foundation::error::{RepackError, RepackResult},
    foundation::math::{clamp01, lerp},
};

/// Layer channel values below this divide to 1 instead of `base / layer`.
pub const DIVIDE_EPSILON: f32 = 0.001;

/// Stand-in for an absent base or layer image: opaque black.
pub const OPAQUE_BLACK: Rgba = [0.0, 0.0, 0.0, 1.0];

/// Per-channel blend formula.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// `b * l`
    #[default]
    Multiply,
    /// `clamp01(b + l)`
    Add,
    /// `1 - (1 - b) * (1 - l)`
    Screen,
    /// Multiply below mid-gray, screen above, keyed on the base.
    Overlay,
    /// `clamp01(b - l)`
    Subtract,
    /// `clamp01(b / l)`, 1 when the layer is near zero.
    Divide,
    /// `min(b, l)`
    Darken,
    /// `max(b, l)`
    Lighten,
    /// W3C soft light.
    SoftLight,
    /// Overlay keyed on the layer.
    HardLight,
}

impl BlendMode {
    /// Every mode, in declaration order.
    pub const ALL: [BlendMode; 10] = [
        BlendMode::Multiply,
        BlendMode::Add,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Subtract,
        BlendMode::Divide,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::SoftLight,
        BlendMode::HardLight,
    ];

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            BlendMode::Multiply => "Multiply",
            BlendMode::Add => "Add",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Subtract => "Subtract",
            BlendMode::Divide => "Divide",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::SoftLight => "Soft Light",
            BlendMode::HardLight => "Hard Light",
        }
    }

    /// Blend one channel of base `b` with layer `l`.
    #[inline]
    pub fn blend_channel(self, b: f32, l: f32) -> f32 {
        match self {
            BlendMode::Multiply => b * l,
            BlendMode::Add => clamp01(b + l),
            BlendMode::Screen => 1.0 - (1.0 - b) * (1.0 - l),
            BlendMode::Overlay => overlay_channel(b, l),
            BlendMode::Subtract => clamp01(b - l),
            BlendMode::Divide => clamp01(if l < DIVIDE_EPSILON { 1.0 } else { b / l }),
            BlendMode::Darken => b.min(l),
            BlendMode::Lighten => b.max(l),
            BlendMode::SoftLight => soft_light_channel(b, l),
            BlendMode::HardLight => overlay_channel(l, b),
        }
    }

    /// Blend every channel (alpha included) independently.
    #[inline]
    pub fn blend(self, base: Rgba, layer: Rgba) -> Rgba {
        [
            self.blend_channel(base[0], layer[0]),
            self.blend_channel(base[1], layer[1]),
            self.blend_channel(base[2], layer[2]),
            self.blend_channel(base[3], layer[3]),
        ]
    }
}

fn overlay_channel(b: f32, l: f32) -> f32 {
    if b < 0.5 {
        2.0 * b * l
    } else {
        1.0 - 2.0 * (1.0 - b) * (1.0 - l)
    }
}

fn soft_light_channel(b: f32, l: f32) -> f32 {
    if l < 0.5 {
        b - (1.0 - 2.0 * l) * b * (1.0 - b)
    } else {
        b + (2.0 * l - 1.0) * (soft_light_d(b) - b)
    }
}

fn soft_light_d(b: f32) -> f32 {
    if b <= 0.25 {
        ((16.0 * b - 12.0) * b + 4.0) * b
    } else {
        b.sqrt()
    }
}

/// Image-independent blend settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlendOptions {
    /// Channel isolation applied to the base.
    #[serde(default)]
    pub base_select: ChannelSelect,
    /// Channel isolation applied to the layer.
    #[serde(default)]
    pub layer_select: ChannelSelect,
    /// Blend formula.
    #[serde(default)]
    pub mode: BlendMode,
    /// Interpolation factor from the isolated base (0) to the blended result (1).
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

fn default_opacity() -> f32 {
    1.0
}

impl Default for BlendOptions {
    fn default() -> Self {
        Self {
            base_select: ChannelSelect::All,
            layer_select: ChannelSelect::All,
            mode: BlendMode::Multiply,
            opacity: 1.0,
        }
    }
}

/// Blend one base pixel with one layer pixel.
///
/// Both sides are channel-isolated first; the result is
/// `lerp(isolated_base, mode(isolated_base, isolated_layer), opacity)` with opacity clamped
/// into `[0, 1]`.
#[inline]
pub fn blend_pixel(base: Rgba, layer: Rgba, opts: &BlendOptions) -> Rgba {
    let opacity = clamp01(opts.opacity);
    let fb = opts.base_select.apply(base);
    let fl = opts.layer_select.apply(layer);
    let blended = opts.mode.blend(fb, fl);
    [
        lerp(fb[0], blended[0], opacity),
        lerp(fb[1], blended[1], opacity),
        lerp(fb[2], blended[2], opacity),
        lerp(fb[3], blended[3], opacity),
    ]
}

/// Parameters of a mix job: which images, how to isolate them and how to blend.
#[derive(Clone, Debug, Default)]
pub struct MixParameters {
    /// Base image; defines the export size.
    pub base: Option<ImageHandle>,
    /// Layer image; absent means opaque black.
    pub layer: Option<ImageHandle>,
    /// Selectors, mode and opacity.
    pub options: BlendOptions,
}

/// Blend `layer` onto `base` at the base's native resolution.
///
/// The layer is nearest-neighbor resampled into the base's coordinate space; `None` is
/// treated as opaque black.
pub fn blend_images(
    base: &PixelBuffer,
    layer: Option<&PixelBuffer>,
    opts: &BlendOptions,
) -> RepackResult<PixelBuffer> {
    let (w, h) = base.dimensions();
    blend_with(Some(base), layer, opts, (w, h), &mut RowDriver::sequential())
}

/// Blend at an arbitrary destination size, resampling both sides. Absent sides are opaque
/// black.
#[tracing::instrument(skip(base, layer, opts, driver))]
pub(crate) fn blend_with(
    base: Option<&PixelBuffer>,
    layer: Option<&PixelBuffer>,
    opts: &BlendOptions,
    dst: (u32, u32),
    driver: &mut RowDriver<'_>,
) -> RepackResult<PixelBuffer> {
    if dst.0 == 0 || dst.1 == 0 {
        return Err(RepackError::dimension(format!(
            "blend destination must be non-zero, got {}x{}",
            dst.0, dst.1
        )));
    }

    let base = SideSampler::new(base, dst)?;
    let layer = SideSampler::new(layer, dst)?;

    driver.run(dst.0, dst.1, |y, row| {
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let out = blend_pixel(base.get(x, y), layer.get(x, y), opts);
            px.copy_from_slice(&out);
        }
    })
}

struct SideSampler<'a> {
    source: Option<(&'a PixelBuffer, Resampler, Vec<u32>)>,
}

impl<'a> SideSampler<'a> {
    fn new(pixels: Option<&'a PixelBuffer>, dst: (u32, u32)) -> RepackResult<Self> {
        let source = match pixels {
            None => None,
            Some(p) => {
                let resampler = Resampler::new(dst, p.dimensions())?;
                Some((p, resampler, resampler.column_map()))
            }
        };
        Ok(Self { source })
    }

    #[inline]
    fn get(&self, x: usize, y: u32) -> Rgba {
        match &self.source {
            None => OPAQUE_BLACK,
            Some((pixels, resampler, columns)) => pixels.pixel(columns[x], resampler.map_y(y)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/blend.rs"]
mod tests;
