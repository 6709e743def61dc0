use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::error::{RepackError, RepackResult};
use crate::foundation::math::Fnv1a64;

static NEXT_MEMORY_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an [`ImageHandle`], used as the pixel cache key.
///
/// File handles are identified by their normalized path, so two handles to the same file
/// share cache entries even if the file changed on disk in between. In-memory handles get a
/// fresh identity on construction which clones share.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageId {
    /// Hash of a normalized filesystem path.
    File(u64),
    /// Process-unique id of an in-memory image.
    Memory(u64),
}

#[derive(Clone, Debug)]
pub(crate) enum ImageStorage {
    /// Straight-alpha RGBA8 pixels that can be read directly.
    Rgba8 {
        width: u32,
        height: u32,
        pixels: Arc<Vec<u8>>,
    },
    /// Encoded image bytes (PNG, TGA, ...); must be rendered before reading.
    Encoded(Arc<Vec<u8>>),
    /// Encoded image on disk.
    File(PathBuf),
}

/// Opaque reference to a source image.
///
/// A handle does not hold decoded pixels; those live in the
/// [`PixelCache`](crate::PixelCache) keyed by [`ImageHandle::id`].
#[derive(Clone, Debug)]
pub struct ImageHandle {
    id: ImageId,
    name: String,
    storage: ImageStorage,
}

impl ImageHandle {
    /// Wrap directly addressable straight-alpha RGBA8 pixels.
    ///
    /// Size mismatches are reported when the handle is decoded, not here.
    pub fn from_rgba8(name: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            id: next_memory_id(),
            name: name.into(),
            storage: ImageStorage::Rgba8 {
                width,
                height,
                pixels: Arc::new(pixels),
            },
        }
    }

    /// Wrap encoded image bytes in any format the `image` crate can read.
    pub fn from_encoded(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: next_memory_id(),
            name: name.into(),
            storage: ImageStorage::Encoded(Arc::new(bytes)),
        }
    }

    /// Reference an encoded image file. The file is not read until decode.
    pub fn from_file(path: impl Into<PathBuf>) -> RepackResult<Self> {
        let path = path.into();
        let key = path_identity_key(&path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.clone());
        Ok(Self {
            id: hash_file_id(&key),
            name,
            storage: ImageStorage::File(path),
        })
    }

    /// Cache identity of this handle.
    pub fn id(&self) -> ImageId {
        self.id
    }

    /// Human-readable name (file stem or caller-provided label).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return `true` when pixels can be read without rendering the image first.
    pub fn is_addressable(&self) -> bool {
        matches!(self.storage, ImageStorage::Rgba8 { .. })
    }

    /// Backing file, for file handles.
    pub fn path(&self) -> Option<&Path> {
        match &self.storage {
            ImageStorage::File(p) => Some(p),
            _ => None,
        }
    }

    pub(crate) fn storage(&self) -> &ImageStorage {
        &self.storage
    }
}

fn next_memory_id() -> ImageId {
    ImageId::Memory(NEXT_MEMORY_ID.fetch_add(1, Ordering::Relaxed))
}

fn path_identity_key(path: &Path) -> RepackResult<String> {
    let s = path.to_string_lossy().replace('\\', "/");
    let absolute = s.starts_with('/');
    let parts: Vec<&str> = s
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();
    if parts.is_empty() {
        return Err(RepackError::validation(
            "image path must contain a file name",
        ));
    }
    let joined = parts.join("/");
    Ok(if absolute { format!("/{joined}") } else { joined })
}

fn hash_file_id(key: &str) -> ImageId {
    let mut hasher = Fnv1a64::new_default();
    hasher.write_u8(b'F');
    hasher.write_bytes(key.as_bytes());
    hasher.write_u8(0);
    ImageId::File(hasher.finish())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/handle.rs"]
mod tests;
