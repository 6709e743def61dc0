use std::path::Path;

use crate::{
    assets::handle::{ImageHandle, ImageStorage},
    foundation::core::PixelBuffer,
    foundation::error::{RepackError, RepackResult},
};

/// How a handle's pixels were obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodePath {
    /// Pixels were directly addressable and read as-is.
    Direct,
    /// The image was rendered into an off-screen RGBA8 target which was then read back.
    Offscreen,
}

/// Decode a handle into a flat RGBA buffer at the image's native resolution.
pub fn decode_handle(handle: &ImageHandle) -> RepackResult<(PixelBuffer, DecodePath)> {
    match handle.storage() {
        ImageStorage::Rgba8 {
            width,
            height,
            pixels,
        } => read_direct(*width, *height, pixels)
            .map(|buf| (buf, DecodePath::Direct))
            .map_err(|e| RepackError::decode(format!("image '{}': {e}", handle.name()))),
        ImageStorage::Encoded(bytes) => render_offscreen(bytes)
            .map(|buf| (buf, DecodePath::Offscreen))
            .map_err(|e| RepackError::decode(format!("image '{}': {e}", handle.name()))),
        ImageStorage::File(path) => {
            let bytes = read_file(path)?;
            render_offscreen(&bytes)
                .map(|buf| (buf, DecodePath::Offscreen))
                .map_err(|e| RepackError::decode(format!("image '{}': {e}", path.display())))
        }
    }
}

/// Decode encoded image bytes (any format supported by `image`) into a [`PixelBuffer`].
pub fn decode_image(bytes: &[u8]) -> RepackResult<PixelBuffer> {
    render_offscreen(bytes)
}

fn read_direct(width: u32, height: u32, pixels: &[u8]) -> RepackResult<PixelBuffer> {
    PixelBuffer::from_rgba8(width, height, pixels)
}

fn render_offscreen(bytes: &[u8]) -> RepackResult<PixelBuffer> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| RepackError::decode(format!("decode image from memory: {e}")))?;

    // Flatten whatever the source format is (gray, 16-bit, palette) into an RGBA8 target.
    let target = dyn_img.to_rgba8();
    let (width, height) = target.dimensions();
    PixelBuffer::from_rgba8(width, height, target.as_raw())
        .map_err(|e| RepackError::decode(format!("read back off-screen target: {e}")))
}

fn read_file(path: &Path) -> RepackResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| RepackError::decode(format!("read image '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
