//! Texrepack is a channel compositing engine for texture repacking.
//!
//! It packs four independently sourced channels into one RGBA image, splits an image into
//! grayscale channel images, and blends two images with one of ten per-channel formulas.
//! Every operation has two paths sharing one sampling policy:
//!
//! - a cheap fixed-size preview that never fails, debounced by a [`PreviewScheduler`]
//! - a full-resolution export that propagates decode errors and detects sources rebound
//!   while it ran
//!
//! Work goes through a [`RepackSession`], which owns the [`PixelCache`] for its lifetime.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod compose;
mod encode;
mod foundation;
mod job;
mod preview;
mod session;

pub use crate::foundation::core::{Channel, PixelBuffer, Rgba};
pub use crate::foundation::error::{RepackError, RepackResult};
pub use crate::foundation::math::{clamp01, lerp, u8_to_unit, unit_to_u8};

pub use crate::assets::cache::{PixelCache, PixelSnapshot};
pub use crate::assets::decode::{DecodePath, decode_handle, decode_image};
pub use crate::assets::handle::{ImageHandle, ImageId};

pub use crate::compose::blend::{
    BlendMode, BlendOptions, DIVIDE_EPSILON, MixParameters, OPAQUE_BLACK, blend_images,
    blend_pixel,
};
pub use crate::compose::channel::{ChannelSelect, sample};
pub use crate::compose::pack::{
    ChannelSlot, FALLBACK_EXPORT_SIZE, PREVIEW_SIZE, PackSource, default_channel_value,
    export_size, pack_channels,
};
pub use crate::compose::resample::Resampler;
pub use crate::compose::rows::Progress;
pub use crate::compose::unpack::{
    UnpackChannel, UnpackParameters, UnpackedChannels, default_unpack_channels, unpack_channels,
};

pub use crate::encode::png::{
    DEFAULT_MIXED_NAME, DEFAULT_PACKED_NAME, DEFAULT_UNPACKED_NAME, suggest_base_name,
    unpack_output_paths, write_png_rgb, write_png_rgba, write_unpacked,
};
pub use crate::job::model::{
    MixJob, PackJob, RepackJob, SlotSpec, UnpackJob, job_root, normalize_rel_path,
};
pub use crate::preview::scheduler::{
    PREVIEW_PERIOD, PreviewScheduler, PreviewState, PreviewTimer, TickOutcome,
};
pub use crate::session::repack_session::{PreviewView, RepackSession, RepackSessionOpts};
