use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    assets::decode::decode_handle,
    assets::handle::{ImageHandle, ImageId},
    foundation::core::PixelBuffer,
    foundation::error::{RepackError, RepackResult},
};

/// Decoded pixels together with the cache generation they were read at.
#[derive(Clone, Debug)]
pub struct PixelSnapshot {
    /// Identity of the source handle.
    pub id: ImageId,
    /// Invalidation generation of `id` at read time.
    pub generation: u64,
    /// Decoded pixels.
    pub pixels: PixelBuffer,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<ImageId, PixelBuffer>,
    // Bumped on every invalidation of an id; never reset, so stale snapshots stay detectable.
    generations: HashMap<ImageId, u64>,
    decode_counts: HashMap<ImageId, u64>,
}

impl CacheState {
    fn generation(&self, id: ImageId) -> u64 {
        self.generations.get(&id).copied().unwrap_or(0)
    }

    fn invalidate(&mut self, id: ImageId) -> bool {
        let had_entry = self.entries.remove(&id).is_some();
        *self.generations.entry(id).or_insert(0) += 1;
        had_entry
    }

    fn decode_and_insert(&mut self, handle: &ImageHandle) -> RepackResult<PixelBuffer> {
        let id = handle.id();
        let (pixels, path) = decode_handle(handle)?;
        tracing::debug!(
            image = handle.name(),
            ?id,
            ?path,
            width = pixels.width(),
            height = pixels.height(),
            "decoded source image"
        );
        *self.decode_counts.entry(id).or_insert(0) += 1;
        self.entries.insert(id, pixels.clone());
        Ok(pixels)
    }
}

/// Memoizing resolver from [`ImageHandle`] to decoded [`PixelBuffer`].
///
/// Entries are keyed by [`ImageId`] (physical identity, not UI slot) and live until
/// invalidated. Reads take a shared lock; decoding a miss, invalidation and
/// [`PixelCache::reload`] take the exclusive lock, so an invalidation never interleaves
/// with the decode of the same key.
#[derive(Default)]
pub struct PixelCache {
    state: RwLock<CacheState>,
}

impl std::fmt::Debug for PixelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("PixelCache")
            .field("entries", &state.entries.len())
            .finish()
    }
}

impl PixelCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the pixels for `handle`, decoding them on first use.
    pub fn get_pixels(&self, handle: &ImageHandle) -> RepackResult<PixelBuffer> {
        self.snapshot(handle).map(|s| s.pixels)
    }

    /// Like [`PixelCache::get_pixels`] but also reports the invalidation generation, for
    /// callers that must later prove the source was not rebound while they used it.
    pub fn snapshot(&self, handle: &ImageHandle) -> RepackResult<PixelSnapshot> {
        let id = handle.id();
        {
            let state = self.read();
            if let Some(pixels) = state.entries.get(&id) {
                tracing::trace!(image = handle.name(), ?id, "pixel cache hit");
                return Ok(PixelSnapshot {
                    id,
                    generation: state.generation(id),
                    pixels: pixels.clone(),
                });
            }
        }

        let mut state = self.write();
        // Another reader may have filled the entry while we waited for the write lock.
        if let Some(pixels) = state.entries.get(&id) {
            return Ok(PixelSnapshot {
                id,
                generation: state.generation(id),
                pixels: pixels.clone(),
            });
        }
        tracing::debug!(image = handle.name(), ?id, "pixel cache miss");
        let pixels = state.decode_and_insert(handle)?;
        Ok(PixelSnapshot {
            id,
            generation: state.generation(id),
            pixels,
        })
    }

    /// Drop the cached pixels for `handle`.
    ///
    /// Must be called whenever a slot is rebound to new content under an identity that may
    /// already be cached. Returns `true` if an entry was removed.
    pub fn invalidate(&self, handle: &ImageHandle) -> bool {
        self.invalidate_id(handle.id())
    }

    /// [`PixelCache::invalidate`] by raw identity.
    pub fn invalidate_id(&self, id: ImageId) -> bool {
        let removed = self.write().invalidate(id);
        tracing::debug!(?id, removed, "pixel cache invalidate");
        removed
    }

    /// Invalidate and immediately re-decode `handle` inside one exclusive section.
    pub fn reload(&self, handle: &ImageHandle) -> RepackResult<PixelBuffer> {
        let mut state = self.write();
        state.invalidate(handle.id());
        state.decode_and_insert(handle)
    }

    /// Fail with [`RepackError::CacheInvalidationRace`] if `snapshot.id` was invalidated
    /// after `snapshot` was taken.
    pub fn ensure_current(&self, snapshot: &PixelSnapshot) -> RepackResult<()> {
        let now = self.read().generation(snapshot.id);
        if now != snapshot.generation {
            return Err(RepackError::invalidation_race(format!(
                "source {:?} was invalidated during the job (generation {} -> {now})",
                snapshot.id, snapshot.generation
            )));
        }
        Ok(())
    }

    /// Current invalidation generation of `id` (0 if never invalidated).
    pub fn generation(&self, id: ImageId) -> u64 {
        self.read().generation(id)
    }

    /// Return `true` if pixels for `id` are cached.
    pub fn contains(&self, id: ImageId) -> bool {
        self.read().entries.contains_key(&id)
    }

    /// How many times pixels for `id` have been decoded by this cache.
    pub fn decode_count(&self, id: ImageId) -> u64 {
        self.read().decode_counts.get(&id).copied().unwrap_or(0)
    }

    /// Number of cached images.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Return `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invalidate every cached entry.
    pub fn clear(&self) {
        let mut state = self.write();
        let ids: Vec<ImageId> = state.entries.keys().copied().collect();
        for id in ids {
            state.invalidate(id);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
