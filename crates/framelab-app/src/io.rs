//! Reading and writing image files as BGRA frames.

use std::path::Path;

use anyhow::{Context, Result};
use framelab_core::PixelBuffer;
use image::{DynamicImage, ImageFormat, RgbaImage};

/// Decode any supported image file into a packed BGRA frame.
pub fn load_frame(path: &Path) -> Result<PixelBuffer> {
    let image = image::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    let mut bytes = image.into_raw();
    swap_red_blue(&mut bytes);
    Ok(PixelBuffer::from_packed(width, height, bytes)?)
}

/// Write `frame` to `path`, choosing the format from the extension.
/// Formats without alpha get the color channels only.
pub fn save_frame(frame: &PixelBuffer, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("Unknown output format for {}", path.display()))?;

    let mut bytes = frame.to_packed_bytes();
    swap_red_blue(&mut bytes);
    let rgba = RgbaImage::from_raw(frame.width(), frame.height(), bytes)
        .context("Frame does not match its own dimensions")?;

    let image = DynamicImage::ImageRgba8(rgba);
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };
    image
        .save_with_format(path, format)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// BGRA <-> RGBA in place.
fn swap_red_blue(bytes: &mut [u8]) {
    for px in bytes.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}
