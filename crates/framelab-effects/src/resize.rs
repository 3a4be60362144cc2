//! Aspect-preserving downscale/upscale with bicubic resampling.

use enough::Stop;
use framelab_core::{FrameLabError, PixelBuffer, Result};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::debug;

use crate::checkpoint;

/// Resampling filter. Catmull-Rom is the bicubic kernel in `image`.
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Largest size with the same aspect ratio that fits inside
/// `max_width × max_height`, i.e. `floor(dim * min(max_w / w, max_h / h))`.
///
/// Computed in integer arithmetic so the limiting side lands exactly on its
/// bound.
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(FrameLabError::InvalidArgument(format!(
            "cannot scale a {width}x{height} frame"
        )));
    }
    if max_width == 0 || max_height == 0 {
        return Err(FrameLabError::InvalidArgument(format!(
            "resize bounds must be non-zero, got {max_width}x{max_height}"
        )));
    }

    let (w, h) = (width as u64, height as u64);
    let (max_w, max_h) = (max_width as u64, max_height as u64);

    // max_w / w <= max_h / h  <=>  max_w * h <= max_h * w
    let (new_w, new_h) = if max_w * h <= max_h * w {
        (max_w, h * max_w / w)
    } else {
        (w * max_h / h, max_h)
    };

    if new_w == 0 || new_h == 0 {
        return Err(FrameLabError::InvalidArgument(format!(
            "{width}x{height} scaled into {max_width}x{max_height} collapses to {new_w}x{new_h}"
        )));
    }
    Ok((new_w as u32, new_h as u32))
}

/// Scale `src` to fit inside `max_width × max_height`, preserving aspect
/// ratio. Never crops or letterboxes.
pub fn resize(src: &PixelBuffer, max_width: u32, max_height: u32, stop: &dyn Stop) -> Result<PixelBuffer> {
    let (new_width, new_height) = fit_dimensions(src.width(), src.height(), max_width, max_height)?;
    checkpoint(stop, "resize")?;

    // The filter treats the four channels independently, so BGRA bytes can
    // ride through an RGBA image unchanged.
    let image = RgbaImage::from_raw(src.width(), src.height(), src.to_packed_bytes())
        .ok_or_else(|| FrameLabError::TransformFailure("frame bytes do not fit an RGBA image".into()))?;
    let scaled = imageops::resize(&image, new_width, new_height, RESIZE_FILTER);

    debug!(
        from_width = src.width(),
        from_height = src.height(),
        to_width = new_width,
        to_height = new_height,
        "Frame resized"
    );
    PixelBuffer::from_packed(new_width, new_height, scaled.into_raw())
        .map_err(|e| FrameLabError::TransformFailure(e.to_string()))
}
