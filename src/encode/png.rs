use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    compose::unpack::{UnpackChannel, UnpackedChannels},
    foundation::core::{Channel, PixelBuffer},
    foundation::error::{RepackError, RepackResult},
};

/// Default file stem for packed output.
pub const DEFAULT_PACKED_NAME: &str = "PackedTexture";
/// Default file stem for unpacked output.
pub const DEFAULT_UNPACKED_NAME: &str = "UnpackedTexture";
/// Default file stem for mixed output.
pub const DEFAULT_MIXED_NAME: &str = "MixedTexture";

const STRIPPED_SUFFIXES: [&str; 6] = [
    "_packed",
    "_pack",
    "_combined",
    "_tex",
    "_diffuse",
    "_albedo",
];

/// Derive an output base name from a source image name.
///
/// Each known suffix is stripped once, in order, case-insensitively; trailing `_`, `-` and
/// spaces are then trimmed.
pub fn suggest_base_name(name: &str) -> String {
    let mut stem = name;
    for suffix in STRIPPED_SUFFIXES {
        if let Some(cut) = stem.len().checked_sub(suffix.len())
            && stem.is_char_boundary(cut)
            && stem[cut..].eq_ignore_ascii_case(suffix)
        {
            stem = &stem[..cut];
        }
    }
    stem.trim_end_matches(['_', '-', ' ']).to_owned()
}

/// `<dir>/<base><suffix>.png` for every enabled unpack channel, in channel order.
pub fn unpack_output_paths(
    dir: &Path,
    base: &str,
    channels: &[UnpackChannel; 4],
) -> Vec<(Channel, PathBuf)> {
    Channel::ALL
        .into_iter()
        .filter(|c| channels[c.index()].enabled)
        .map(|c| (c, dir.join(format!("{base}{}.png", channels[c.index()].suffix))))
        .collect()
}

/// Encode `pixels` as an RGBA8 PNG at `path`.
pub fn write_png_rgba(path: &Path, pixels: &PixelBuffer, overwrite: bool) -> RepackResult<()> {
    write_png(path, pixels, image::ColorType::Rgba8, overwrite)
}

/// Encode `pixels` as an RGB8 PNG at `path`, dropping alpha.
pub fn write_png_rgb(path: &Path, pixels: &PixelBuffer, overwrite: bool) -> RepackResult<()> {
    write_png(path, pixels, image::ColorType::Rgb8, overwrite)
}

/// Write every unpacked channel as an RGB PNG named by [`unpack_output_paths`].
///
/// All targets are checked before anything is written, so a refused overwrite leaves the
/// directory untouched.
pub fn write_unpacked(
    dir: &Path,
    base: &str,
    channels: &[UnpackChannel; 4],
    outputs: &UnpackedChannels,
    overwrite: bool,
) -> RepackResult<Vec<PathBuf>> {
    let targets = unpack_output_paths(dir, base, channels);
    if !overwrite {
        for (_, path) in &targets {
            refuse_existing(path)?;
        }
    }

    let mut written = Vec::with_capacity(targets.len());
    for (channel, path) in targets {
        let Some(pixels) = outputs.get(channel) else {
            return Err(RepackError::validation(format!(
                "channel {} is enabled but was not unpacked",
                channel.label()
            )));
        };
        write_png_rgb(&path, pixels, true)?;
        written.push(path);
    }
    Ok(written)
}

fn refuse_existing(path: &Path) -> RepackResult<()> {
    if path.exists() {
        return Err(RepackError::validation(format!(
            "refusing to overwrite existing file '{}'",
            path.display()
        )));
    }
    Ok(())
}

fn write_png(
    path: &Path,
    pixels: &PixelBuffer,
    color: image::ColorType,
    overwrite: bool,
) -> RepackResult<()> {
    if !overwrite {
        refuse_existing(path)?;
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let bytes = match color {
        image::ColorType::Rgb8 => pixels.to_rgb8(),
        _ => pixels.to_rgba8(),
    };
    image::save_buffer_with_format(
        path,
        &bytes,
        pixels.width(),
        pixels.height(),
        color,
        image::ImageFormat::Png,
    )
    .map_err(|e| RepackError::encode(format!("write png '{}': {e}", path.display())))?;

    tracing::debug!(
        path = %path.display(),
        width = pixels.width(),
        height = pixels.height(),
        "wrote png"
    );
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
