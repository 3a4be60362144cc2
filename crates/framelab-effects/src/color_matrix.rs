//! 5×5 affine color matrices: brightness/contrast/saturation, grayscale,
//! sepia and invert.
//!
//! Matrices use the row-vector convention: row `k` holds the contribution of
//! input channel `k` (R, G, B, A) to each output channel, and row 4 is the
//! constant offset. Channel values are normalized to `[0, 1]` before the
//! matrix is applied.

use enough::Stop;
use framelab_core::{Bgra8, PixelBuffer, Result};
use glam::{Mat4, Vec4};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::raster::map_rows;

/// Perceptual luminance weights used by the saturation matrix.
pub const LUM_R: f32 = 0.3086;
pub const LUM_G: f32 = 0.6094;
pub const LUM_B: f32 = 0.0820;

/// Rec.601 luma weights used by grayscale.
pub const LUMA_601: [f32; 3] = [0.299, 0.587, 0.114];

/// Saturation changes smaller than this leave the matrix untouched.
const SATURATION_EPSILON: f32 = 0.1;

/// An affine color transform: `out = linear · in + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorMatrix {
    /// Column `k` is row `k` of the 5×5 matrix.
    linear: Mat4,
    offset: Vec4,
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorMatrix {
    pub const IDENTITY: Self = Self {
        linear: Mat4::IDENTITY,
        offset: Vec4::ZERO,
    };

    /// Build from a 5×5 matrix. The fifth column is implied to be
    /// `[0, 0, 0, 0, 1]` and is ignored.
    pub fn from_rows(rows: [[f32; 5]; 5]) -> Self {
        let row = |k: usize| Vec4::new(rows[k][0], rows[k][1], rows[k][2], rows[k][3]);
        Self {
            linear: Mat4::from_cols(row(0), row(1), row(2), row(3)),
            offset: row(4),
        }
    }

    /// The full 5×5 matrix.
    pub fn to_rows(&self) -> [[f32; 5]; 5] {
        let mut rows = [[0.0f32; 5]; 5];
        for (k, row) in rows.iter_mut().enumerate().take(4) {
            row[..4].copy_from_slice(&self.linear.col(k).to_array());
        }
        rows[4][..4].copy_from_slice(&self.offset.to_array());
        rows[4][4] = 1.0;
        rows
    }

    /// Brightness/contrast/saturation matrix.
    ///
    /// When `|saturation| > 0.1` the RGB block is replaced by the saturation
    /// matrix, so the contrast scaling on the diagonal does not apply.
    pub fn adjustment(brightness: f32, contrast: f32, saturation: f32) -> Self {
        let contrast_factor = (contrast + 100.0) / 100.0;
        let brightness_factor = brightness / 100.0;
        let saturation_factor = (saturation + 100.0) / 100.0;

        let mut rows = identity_rows();
        for c in 0..3 {
            rows[c][c] = contrast_factor;
            rows[4][c] = brightness_factor;
        }

        if saturation.abs() > SATURATION_EPSILON {
            let inv = 1.0 - saturation_factor;
            for (k, lum) in [LUM_R, LUM_G, LUM_B].into_iter().enumerate() {
                for c in 0..3 {
                    rows[k][c] = inv * lum + if c == k { saturation_factor } else { 0.0 };
                }
            }
        }

        Self::from_rows(rows)
    }

    pub fn grayscale() -> Self {
        let mut rows = identity_rows();
        for (k, weight) in LUMA_601.into_iter().enumerate() {
            rows[k][..3].fill(weight);
        }
        Self::from_rows(rows)
    }

    pub fn sepia() -> Self {
        let mut rows = identity_rows();
        rows[0][..3].copy_from_slice(&[0.393, 0.349, 0.272]);
        rows[1][..3].copy_from_slice(&[0.769, 0.686, 0.534]);
        rows[2][..3].copy_from_slice(&[0.189, 0.168, 0.131]);
        Self::from_rows(rows)
    }

    pub fn invert() -> Self {
        let mut rows = identity_rows();
        for c in 0..3 {
            rows[c][c] = -1.0;
            rows[4][c] = 1.0;
        }
        Self::from_rows(rows)
    }

    /// Matrix applying `self` first, then `next`.
    pub fn then(&self, next: &Self) -> Self {
        Self {
            linear: next.linear * self.linear,
            offset: next.linear * self.offset + next.offset,
        }
    }

    #[inline]
    pub fn apply_pixel(&self, px: Bgra8) -> Bgra8 {
        let input = Vec4::new(px.r as f32, px.g as f32, px.b as f32, px.a as f32) / 255.0;
        let out = (self.linear * input + self.offset) * 255.0;
        Bgra8::from_rgba(to_channel(out.x), to_channel(out.y), to_channel(out.z), to_channel(out.w))
    }

    /// Apply to every pixel of `src`, producing a new buffer.
    pub fn apply(&self, src: &PixelBuffer, stop: &dyn Stop) -> Result<PixelBuffer> {
        crate::checkpoint(stop, "color matrix")?;
        let out = map_rows(src, |_, input, output| {
            for (dst, px) in output.iter_mut().zip(input) {
                *dst = self.apply_pixel(*px);
            }
        })?;
        debug!(width = src.width(), height = src.height(), "Color matrix applied");
        Ok(out)
    }
}

fn identity_rows() -> [[f32; 5]; 5] {
    let mut rows = [[0.0f32; 5]; 5];
    for (i, row) in rows.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    rows
}

#[inline]
fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Brightness/contrast/saturation adjustment.
pub fn adjust(
    src: &PixelBuffer,
    brightness: f32,
    contrast: f32,
    saturation: f32,
    stop: &dyn Stop,
) -> Result<PixelBuffer> {
    ColorMatrix::adjustment(brightness, contrast, saturation).apply(src, stop)
}

pub fn grayscale(src: &PixelBuffer, stop: &dyn Stop) -> Result<PixelBuffer> {
    ColorMatrix::grayscale().apply(src, stop)
}

pub fn sepia(src: &PixelBuffer, stop: &dyn Stop) -> Result<PixelBuffer> {
    ColorMatrix::sepia().apply(src, stop)
}

pub fn invert(src: &PixelBuffer, stop: &dyn Stop) -> Result<PixelBuffer> {
    ColorMatrix::invert().apply(src, stop)
}
