use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    assets::handle::ImageHandle,
    compose::blend::{BlendOptions, MixParameters},
    compose::pack::ChannelSlot,
    compose::unpack::{UnpackChannel, UnpackParameters, default_unpack_channels},
    encode::png::{
        DEFAULT_MIXED_NAME, DEFAULT_PACKED_NAME, DEFAULT_UNPACKED_NAME, suggest_base_name,
    },
    foundation::core::Channel,
    foundation::error::{RepackError, RepackResult},
};

/// One repacking operation read from a JSON job file.
///
/// Image paths are relative to the directory containing the job file.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum RepackJob {
    /// Build one image from four channel slots.
    Pack(PackJob),
    /// Split one image into grayscale channel images.
    Unpack(UnpackJob),
    /// Blend a layer onto a base image.
    Mix(MixJob),
}

/// Source of one packed output channel.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotSpec {
    /// Relative image path.
    #[serde(default)]
    pub image: Option<String>,
    /// Channel of `image` to read; defaults to the slot's own output channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    /// Apply `1 - v`.
    #[serde(default)]
    pub invert: bool,
    /// Constant value; overrides `image` when present.
    #[serde(default)]
    pub custom: Option<f32>,
}

/// `{"op":"pack"}` job body.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackJob {
    /// Red output slot.
    #[serde(default)]
    pub r: SlotSpec,
    /// Green output slot.
    #[serde(default)]
    pub g: SlotSpec,
    /// Blue output slot.
    #[serde(default)]
    pub b: SlotSpec,
    /// Alpha output slot.
    #[serde(default)]
    pub a: SlotSpec,
    /// Explicit `[width, height]`; the export size policy applies when absent.
    #[serde(default)]
    pub size: Option<[u32; 2]>,
    /// Output file stem.
    #[serde(default)]
    pub output: Option<String>,
}

/// `{"op":"unpack"}` job body.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnpackJob {
    /// Relative path of the image to split.
    pub source: String,
    /// Per-channel enable flags and suffixes, R, G, B, A.
    #[serde(default = "default_unpack_channels")]
    pub channels: [UnpackChannel; 4],
    /// Output file stem; suffixes are appended per channel.
    #[serde(default)]
    pub output: Option<String>,
}

/// `{"op":"mix"}` job body.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MixJob {
    /// Relative path of the base image.
    #[serde(default)]
    pub base: Option<String>,
    /// Relative path of the layer image.
    #[serde(default)]
    pub layer: Option<String>,
    /// Selectors, mode and opacity.
    #[serde(default)]
    pub blend: BlendOptions,
    /// Output file stem.
    #[serde(default)]
    pub output: Option<String>,
}

impl RepackJob {
    /// Parse and validate a job from JSON text.
    pub fn from_json_str(json: &str) -> RepackResult<Self> {
        let job: Self = serde_json::from_str(json)
            .map_err(|e| RepackError::validation(format!("invalid job JSON: {e}")))?;
        job.validate()?;
        Ok(job)
    }

    /// Read, parse and validate a job file.
    pub fn read(path: &Path) -> RepackResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read job file '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Check paths, constants and output names.
    pub fn validate(&self) -> RepackResult<()> {
        match self {
            RepackJob::Pack(job) => {
                for (channel, slot) in Channel::ALL.into_iter().zip(job.slot_specs()) {
                    if let Some(v) = slot.custom
                        && !(0.0..=1.0).contains(&v)
                    {
                        return Err(RepackError::validation(format!(
                            "slot {} custom value must be in [0, 1], got {v}",
                            channel.label()
                        )));
                    }
                    if let Some(image) = &slot.image {
                        normalize_rel_path(image)?;
                    }
                }
                if let Some([w, h]) = job.size
                    && (w == 0 || h == 0)
                {
                    return Err(RepackError::validation("pack size must be > 0 on both axes"));
                }
            }
            RepackJob::Unpack(job) => {
                normalize_rel_path(&job.source)?;
                for ch in &job.channels {
                    if ch.enabled && !is_plain_name(&ch.suffix, true) {
                        return Err(RepackError::validation(format!(
                            "unpack suffix '{}' must not contain path separators",
                            ch.suffix
                        )));
                    }
                }
            }
            RepackJob::Mix(job) => {
                for image in [&job.base, &job.layer].into_iter().flatten() {
                    normalize_rel_path(image)?;
                }
                if !job.blend.opacity.is_finite() {
                    return Err(RepackError::validation("mix opacity must be finite"));
                }
            }
        }

        if let Some(name) = self.explicit_output()
            && !is_plain_name(name, false)
        {
            return Err(RepackError::validation(format!(
                "output name '{name}' must be a non-empty file stem"
            )));
        }
        Ok(())
    }

    /// Output file stem: the explicit `output`, else one derived from the first source
    /// image, else the operation's default name.
    pub fn output_name(&self) -> String {
        if let Some(name) = self.explicit_output() {
            return name.to_owned();
        }
        match self {
            RepackJob::Pack(job) => job
                .slot_specs()
                .into_iter()
                .find_map(|s| s.image.as_deref())
                .and_then(derived_name)
                .unwrap_or_else(|| DEFAULT_PACKED_NAME.to_owned()),
            RepackJob::Unpack(job) => {
                derived_name(&job.source).unwrap_or_else(|| DEFAULT_UNPACKED_NAME.to_owned())
            }
            RepackJob::Mix(job) => job
                .base
                .as_deref()
                .and_then(derived_name)
                .map(|n| format!("{n}_mixed"))
                .unwrap_or_else(|| DEFAULT_MIXED_NAME.to_owned()),
        }
    }

    fn explicit_output(&self) -> Option<&str> {
        match self {
            RepackJob::Pack(job) => job.output.as_deref(),
            RepackJob::Unpack(job) => job.output.as_deref(),
            RepackJob::Mix(job) => job.output.as_deref(),
        }
    }
}

impl PackJob {
    fn slot_specs(&self) -> [&SlotSpec; 4] {
        [&self.r, &self.g, &self.b, &self.a]
    }

    /// Resolve the four slots, opening images relative to `root`.
    pub fn slots(&self, root: &Path) -> RepackResult<[ChannelSlot; 4]> {
        let mut out = Channel::ALL.map(ChannelSlot::unbound);
        for (slot, spec) in out.iter_mut().zip(self.slot_specs()) {
            if let Some(channel) = spec.channel {
                slot.channel = channel;
            }
            slot.invert = spec.invert;
            if let Some(v) = spec.custom {
                slot.use_custom = true;
                slot.custom_value = v;
            }
            if let Some(image) = &spec.image {
                slot.source = Some(open_image(root, image)?);
            }
        }
        Ok(out)
    }

    /// Explicit output size, if any.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size.map(|[w, h]| (w, h))
    }
}

impl UnpackJob {
    /// Resolve the source image relative to `root`.
    pub fn parameters(&self, root: &Path) -> RepackResult<UnpackParameters> {
        Ok(UnpackParameters {
            source: open_image(root, &self.source)?,
            channels: self.channels.clone(),
        })
    }
}

impl MixJob {
    /// Resolve base and layer relative to `root`.
    pub fn parameters(&self, root: &Path) -> RepackResult<MixParameters> {
        let open = |p: &Option<String>| p.as_deref().map(|p| open_image(root, p)).transpose();
        Ok(MixParameters {
            base: open(&self.base)?,
            layer: open(&self.layer)?,
            options: self.blend,
        })
    }
}

/// Normalize and validate job-relative image paths.
///
/// The result uses `/` separators, drops `.` segments and rejects absolute paths or parent
/// traversals (`..`).
pub fn normalize_rel_path(source: &str) -> RepackResult<String> {
    let s = source.replace('\\', "/");
    if s.is_empty() {
        return Err(RepackError::validation("image path must be non-empty"));
    }
    if s.starts_with('/') || has_drive_prefix(&s) {
        return Err(RepackError::validation(format!(
            "image path '{source}' must be relative to the job file"
        )));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(RepackError::validation(format!(
                "image path '{source}' must not contain '..'"
            )));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(RepackError::validation("image path must contain a file name"));
    }
    Ok(out.join("/"))
}

/// Directory job-relative paths resolve against.
pub fn job_root(job_path: &Path) -> PathBuf {
    match job_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn open_image(root: &Path, rel: &str) -> RepackResult<ImageHandle> {
    ImageHandle::from_file(root.join(normalize_rel_path(rel)?))
}

fn derived_name(rel: &str) -> Option<String> {
    let stem = Path::new(rel).file_stem()?.to_str()?;
    let name = suggest_base_name(stem);
    (!name.is_empty()).then_some(name)
}

fn has_drive_prefix(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':'
}

fn is_plain_name(name: &str, allow_empty: bool) -> bool {
    (allow_empty || !name.trim().is_empty())
        && !name.contains(['/', '\\'])
        && name != "."
        && name != ".."
}

#[cfg(test)]
#[path = "../../tests/unit/job/model.rs"]
mod tests;
