use std::str::FromStr;

use crate::{
    assets::cache::{PixelCache, PixelSnapshot},
    assets::handle::ImageHandle,
    compose::blend::{MixParameters, OPAQUE_BLACK, blend_with},
    compose::channel::ChannelSelect,
    compose::pack::{
        ChannelSlot, FALLBACK_EXPORT_SIZE, PREVIEW_SIZE, PackSource, export_size, pack_with,
    },
    compose::rows::{Progress, RowDriver, build_thread_pool},
    compose::unpack::{UnpackedChannels, unpack_channels},
    foundation::core::{Channel, PixelBuffer},
    foundation::error::{RepackError, RepackResult},
};

/// Options controlling a [`RepackSession`].
#[derive(Clone, Debug)]
pub struct RepackSessionOpts {
    /// Fill full-resolution exports on a dedicated rayon pool.
    pub parallel: bool,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Side length of the square preview buffers.
    pub preview_size: u32,
    /// Pack export size when no slot is bound to an image.
    pub fallback_size: (u32, u32),
}

impl Default for RepackSessionOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            preview_size: PREVIEW_SIZE,
            fallback_size: FALLBACK_EXPORT_SIZE,
        }
    }
}

/// What a pack preview displays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewView {
    /// The packed RGBA composite.
    #[default]
    Rgba,
    /// Red output channel as gray.
    R,
    /// Green output channel as gray.
    G,
    /// Blue output channel as gray.
    B,
    /// Alpha output channel as gray.
    A,
}

impl PreviewView {
    /// Equivalent pixel isolation.
    pub fn select(self) -> ChannelSelect {
        match self {
            PreviewView::Rgba => ChannelSelect::All,
            PreviewView::R => ChannelSelect::Isolate(Channel::R),
            PreviewView::G => ChannelSelect::Isolate(Channel::G),
            PreviewView::B => ChannelSelect::Isolate(Channel::B),
            PreviewView::A => ChannelSelect::Isolate(Channel::A),
        }
    }
}

impl FromStr for PreviewView {
    type Err = RepackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgba" => Ok(Self::Rgba),
            "r" => Ok(Self::R),
            "g" => Ok(Self::G),
            "b" => Ok(Self::B),
            "a" => Ok(Self::A),
            other => Err(RepackError::validation(format!(
                "unknown preview view '{other}' (expected rgba, r, g, b or a)"
            ))),
        }
    }
}

/// One tool session: owns the pixel cache and the export thread pool.
///
/// Full-resolution calls propagate decode failures and detect sources invalidated while
/// they ran. Preview calls never fail: a slot whose image cannot be decoded falls back to
/// its default value.
pub struct RepackSession {
    cache: PixelCache,
    pool: Option<rayon::ThreadPool>,
    blank_preview: PixelBuffer,
    opts: RepackSessionOpts,
}

impl std::fmt::Debug for RepackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepackSession")
            .field("cache", &self.cache)
            .field("parallel", &self.pool.is_some())
            .field("opts", &self.opts)
            .finish()
    }
}

impl RepackSession {
    /// Construct a session with an empty cache.
    pub fn new(opts: RepackSessionOpts) -> RepackResult<Self> {
        if opts.preview_size == 0 {
            return Err(RepackError::validation("preview_size must be >= 1"));
        }
        if opts.fallback_size.0 == 0 || opts.fallback_size.1 == 0 {
            return Err(RepackError::validation(
                "fallback_size must be non-zero on both axes",
            ));
        }
        let pool = if opts.parallel {
            Some(build_thread_pool(opts.threads)?)
        } else {
            None
        };
        let blank_preview = PixelBuffer::solid(opts.preview_size, opts.preview_size, OPAQUE_BLACK)?;
        Ok(Self {
            cache: PixelCache::new(),
            pool,
            blank_preview,
            opts,
        })
    }

    /// Session options.
    pub fn opts(&self) -> &RepackSessionOpts {
        &self.opts
    }

    /// The session's pixel cache.
    pub fn cache(&self) -> &PixelCache {
        &self.cache
    }

    /// Drop cached pixels for `handle` after its slot was rebound to new content.
    pub fn invalidate_cache(&self, handle: &ImageHandle) -> bool {
        self.cache.invalidate(handle)
    }

    /// Pack four slots into a `width x height` image.
    pub fn pack_synchronous(
        &self,
        slots: &[ChannelSlot; 4],
        width: u32,
        height: u32,
    ) -> RepackResult<PixelBuffer> {
        self.pack_with_progress(slots, Some((width, height)), None)
    }

    /// Pack at the export size: the largest bound source on each axis, or the fallback size
    /// when every slot is constant or unbound.
    pub fn export_pack(&self, slots: &[ChannelSlot; 4]) -> RepackResult<PixelBuffer> {
        self.pack_with_progress(slots, None, None)
    }

    /// Export size [`RepackSession::export_pack`] would use. Decodes bound sources.
    pub fn pack_export_size(&self, slots: &[ChannelSlot; 4]) -> RepackResult<(u32, u32)> {
        let (sources, _) = self.resolve_slots(slots)?;
        Ok(export_size(&sources, self.opts.fallback_size))
    }

    /// Full-resolution pack with optional explicit size and progress reporting.
    ///
    /// `size = None` applies the export size policy.
    #[tracing::instrument(skip(self, slots, progress))]
    pub fn pack_with_progress<'a>(
        &'a self,
        slots: &[ChannelSlot; 4],
        size: Option<(u32, u32)>,
        progress: Option<&'a mut dyn FnMut(Progress)>,
    ) -> RepackResult<PixelBuffer> {
        let (sources, snapshots) = self.resolve_slots(slots)?;
        let (width, height) =
            size.unwrap_or_else(|| export_size(&sources, self.opts.fallback_size));
        let out = pack_with(&sources, width, height, &mut self.driver(progress))?;
        self.ensure_current(&snapshots)?;
        Ok(out)
    }

    /// Low-resolution pack for display. Never fails.
    #[tracing::instrument(skip(self, slots))]
    pub fn pack_preview(&self, slots: &[ChannelSlot; 4], view: PreviewView) -> PixelBuffer {
        let sources =
            Channel::ALL.map(|c| PackSource::resolve_or_default(&slots[c.index()], c, &self.cache));
        let size = self.opts.preview_size;
        let packed = pack_with(&sources, size, size, &mut RowDriver::sequential())
            .and_then(|buf| view.select().apply_buffer(&buf));
        self.or_blank(packed)
    }

    /// Split `source` into one grayscale image per enabled channel at native size.
    pub fn unpack_synchronous(
        &self,
        source: &ImageHandle,
        enabled: [bool; 4],
    ) -> RepackResult<UnpackedChannels> {
        let snap = self.cache.snapshot(source)?;
        let out = unpack_channels(&snap.pixels, enabled)?;
        self.cache.ensure_current(&snap)?;
        Ok(out)
    }

    /// Blend at the base image's native resolution.
    pub fn blend_synchronous(&self, params: &MixParameters) -> RepackResult<PixelBuffer> {
        self.blend_with_progress(params, None)
    }

    /// [`RepackSession::blend_synchronous`] with progress reporting.
    #[tracing::instrument(skip(self, params, progress))]
    pub fn blend_with_progress<'a>(
        &'a self,
        params: &MixParameters,
        progress: Option<&'a mut dyn FnMut(Progress)>,
    ) -> RepackResult<PixelBuffer> {
        let base_handle = params
            .base
            .as_ref()
            .ok_or_else(|| RepackError::validation("blend export requires a base image"))?;
        let base = self.cache.snapshot(base_handle)?;
        let layer = match &params.layer {
            Some(h) => Some(self.cache.snapshot(h)?),
            None => None,
        };

        let out = blend_with(
            Some(&base.pixels),
            layer.as_ref().map(|s| &s.pixels),
            &params.options,
            base.pixels.dimensions(),
            &mut self.driver(progress),
        )?;

        self.cache.ensure_current(&base)?;
        if let Some(layer) = &layer {
            self.cache.ensure_current(layer)?;
        }
        Ok(out)
    }

    /// Low-resolution blend for display; both sides are resampled into the preview square
    /// and an absent or undecodable side is opaque black. Never fails.
    #[tracing::instrument(skip(self, params))]
    pub fn blend_preview(&self, params: &MixParameters) -> PixelBuffer {
        let base = self.preview_pixels(params.base.as_ref(), "base");
        let layer = self.preview_pixels(params.layer.as_ref(), "layer");
        let size = self.opts.preview_size;
        let blended = blend_with(
            base.as_ref(),
            layer.as_ref(),
            &params.options,
            (size, size),
            &mut RowDriver::sequential(),
        );
        self.or_blank(blended)
    }

    fn resolve_slots(
        &self,
        slots: &[ChannelSlot; 4],
    ) -> RepackResult<([PackSource; 4], Vec<PixelSnapshot>)> {
        let mut snapshots = Vec::new();
        let mut resolved = Vec::with_capacity(4);
        for channel in Channel::ALL {
            let (source, snap) =
                PackSource::resolve(&slots[channel.index()], channel, &self.cache)?;
            resolved.push(source);
            snapshots.extend(snap);
        }
        let sources: [PackSource; 4] = resolved
            .try_into()
            .map_err(|_| RepackError::validation("pack requires exactly four slots"))?;
        Ok((sources, snapshots))
    }

    fn ensure_current(&self, snapshots: &[PixelSnapshot]) -> RepackResult<()> {
        for snap in snapshots {
            self.cache.ensure_current(snap)?;
        }
        Ok(())
    }

    fn driver<'a>(&'a self, progress: Option<&'a mut dyn FnMut(Progress)>) -> RowDriver<'a> {
        RowDriver::new(self.pool.as_ref(), progress)
    }

    fn preview_pixels(&self, handle: Option<&ImageHandle>, role: &str) -> Option<PixelBuffer> {
        let handle = handle?;
        match self.cache.get_pixels(handle) {
            Ok(pixels) => Some(pixels),
            Err(e) => {
                tracing::warn!(
                    image = handle.name(),
                    role,
                    error = %e,
                    "preview image failed to decode, treating as black"
                );
                None
            }
        }
    }

    fn or_blank(&self, result: RepackResult<PixelBuffer>) -> PixelBuffer {
        match result {
            Ok(buf) => buf,
            Err(e) => {
                tracing::warn!(error = %e, "preview composite failed, showing blank preview");
                self.blank_preview.clone()
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/repack_session.rs"]
mod tests;
