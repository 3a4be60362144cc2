//! Sobel edge detection on the luminance of a frame.

use enough::Stop;
use framelab_core::{Bgra8, PixelBuffer, Result};
use rayon::prelude::*;
use tracing::debug;

use crate::checkpoint;
use crate::color_matrix::grayscale;
use crate::raster::rebuild;

const SOBEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const SOBEL_Y: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// Gradient magnitude of the grayscale frame, written to R, G and B with
/// opaque alpha.
///
/// Only interior pixels are computed. The one-pixel border keeps the zeroed
/// value of the fresh allocation (transparent black), and frames narrower
/// or shorter than three pixels come back entirely zeroed.
pub fn detect_edges(src: &PixelBuffer, stop: &dyn Stop) -> Result<PixelBuffer> {
    let gray = grayscale(src, stop)?;
    checkpoint(stop, "sobel")?;

    let (width, height) = (gray.width(), gray.height());
    let stride = gray.stride() as usize;
    let mut out = PixelBuffer::zeroed_like(&gray).into_bytes();

    if width >= 3 && height >= 3 {
        let row_bytes = gray.row_bytes();
        out.par_chunks_mut(stride)
            .enumerate()
            .skip(1)
            .take(height as usize - 2)
            .for_each(|(y, row)| {
                let y = y as u32;
                let window = [
                    gray.pixels_in_row(y - 1),
                    gray.pixels_in_row(y),
                    gray.pixels_in_row(y + 1),
                ];
                let row: &mut [Bgra8] = bytemuck::cast_slice_mut(&mut row[..row_bytes]);
                for x in 1..width as usize - 1 {
                    let magnitude = gradient_magnitude(&window, x);
                    row[x] = Bgra8::new(magnitude, magnitude, magnitude, 255);
                }
            });
    }

    debug!(width, height, "Edge detection complete");
    rebuild(width, height, gray.stride(), out)
}

/// Sobel magnitude at column `x` of the middle row of `window`.
#[inline]
fn gradient_magnitude(window: &[&[Bgra8]; 3], x: usize) -> u8 {
    let mut gx = 0i32;
    let mut gy = 0i32;
    for (ky, row) in window.iter().enumerate() {
        for kx in 0..3 {
            // Grayscale output has equal channels; red carries the luminance.
            let lum = row[x + kx - 1].r as i32;
            gx += SOBEL_X[ky][kx] * lum;
            gy += SOBEL_Y[ky][kx] * lum;
        }
    }
    (((gx * gx + gy * gy) as f32).sqrt().round()).min(255.0) as u8
}
