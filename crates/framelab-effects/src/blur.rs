//! Multi-pass separable box blur approximating a Gaussian.
//!
//! Each pass runs a horizontal box average over every row, then a vertical
//! box average over every column. The window is clamped at the frame edges
//! and divided by its clamped length, so edge pixels are not darkened.
//! Stages ping-pong between two byte planes: a stage only reads the frozen
//! output of the previous stage.

use enough::Stop;
use framelab_core::{Bgra8, PixelBuffer, Result, MAX_BLUR_RADIUS};
use rayon::prelude::*;
use tracing::debug;

use crate::checkpoint;
use crate::raster::{rebuild, row_pixels};

/// Upper bound on the number of horizontal+vertical passes.
pub const MAX_PASSES: i32 = 3;

/// Rows handled by one work item of the vertical stage.
const VERTICAL_BAND_ROWS: usize = 32;

/// Blur `src` with the given radius.
///
/// A radius of zero or less returns an unchanged copy. Radii above
/// [`MAX_BLUR_RADIUS`] are clamped. The pass count is `min(3, radius)`.
pub fn blur(src: &PixelBuffer, radius: i32, stop: &dyn Stop) -> Result<PixelBuffer> {
    if radius <= 0 {
        return Ok(src.clone());
    }
    let radius = radius.min(MAX_BLUR_RADIUS);
    let passes = radius.min(MAX_PASSES);
    let radius = radius as usize;

    let plane = Plane {
        width: src.width() as usize,
        height: src.height() as usize,
        stride: src.stride() as usize,
    };

    let mut front = src.as_bytes().to_vec();
    let mut back = front.clone();

    for pass in 0..passes {
        checkpoint(stop, "blur horizontal")?;
        plane.horizontal(&front, &mut back, radius);
        std::mem::swap(&mut front, &mut back);

        checkpoint(stop, "blur vertical")?;
        plane.vertical(&front, &mut back, radius);
        std::mem::swap(&mut front, &mut back);

        debug!(pass, radius, "Blur pass complete");
    }

    rebuild(src.width(), src.height(), src.stride(), front)
}

/// Geometry of the byte planes being blurred.
#[derive(Debug, Clone, Copy)]
struct Plane {
    width: usize,
    height: usize,
    stride: usize,
}

impl Plane {
    #[inline]
    fn row_bytes(&self) -> usize {
        self.width * 4
    }

    /// Box-average every row of `src` into `dst`. Rows are independent.
    fn horizontal(&self, src: &[u8], dst: &mut [u8], radius: usize) {
        let row_bytes = self.row_bytes();
        dst.par_chunks_mut(self.stride)
            .zip(src.par_chunks(self.stride))
            .for_each(|(out, input)| {
                let input: &[Bgra8] = bytemuck::cast_slice(&input[..row_bytes]);
                let out: &mut [Bgra8] = bytemuck::cast_slice_mut(&mut out[..row_bytes]);
                box_average_line(input, out, radius);
            });
    }

    /// Box-average every column of `src` into `dst`.
    ///
    /// Work is split into horizontal bands of rows; each band keeps running
    /// column sums and slides them down, so output rows are written by
    /// exactly one worker.
    fn vertical(&self, src: &[u8], dst: &mut [u8], radius: usize) {
        let plane = *self;
        let row_bytes = self.row_bytes();
        dst.par_chunks_mut(self.stride * VERTICAL_BAND_ROWS)
            .enumerate()
            .for_each(|(band, out)| {
                let y0 = band * VERTICAL_BAND_ROWS;
                let mut sums = vec![[0u32; 4]; plane.width];

                let first = y0.saturating_sub(radius);
                let last = (y0 + radius + 1).min(plane.height);
                for y in first..last {
                    accumulate(&mut sums, plane.row(src, y));
                }

                for (offset, out_row) in out.chunks_mut(plane.stride).enumerate() {
                    let y = y0 + offset;
                    let lo = y.saturating_sub(radius);
                    let hi = (y + radius + 1).min(plane.height);
                    let count = (hi - lo) as u32;

                    let out_px: &mut [Bgra8] = bytemuck::cast_slice_mut(&mut out_row[..row_bytes]);
                    for (px, sum) in out_px.iter_mut().zip(&sums) {
                        *px = average(sum, count);
                    }

                    if y + radius + 1 < plane.height {
                        accumulate(&mut sums, plane.row(src, y + radius + 1));
                    }
                    if y >= radius {
                        subtract(&mut sums, plane.row(src, y - radius));
                    }
                }
            });
    }

    #[inline]
    fn row<'a>(&self, bytes: &'a [u8], y: usize) -> &'a [Bgra8] {
        row_pixels(bytes, y, self.stride, self.width)
    }
}

/// Sliding-window box average of one line of pixels.
fn box_average_line(input: &[Bgra8], out: &mut [Bgra8], radius: usize) {
    let n = input.len();
    let mut sum = [0u32; 4];
    for px in &input[..(radius + 1).min(n)] {
        add(&mut sum, px);
    }

    for (i, dst) in out.iter_mut().enumerate() {
        let lo = i.saturating_sub(radius);
        let hi = (i + radius + 1).min(n);
        *dst = average(&sum, (hi - lo) as u32);

        if i + radius + 1 < n {
            add(&mut sum, &input[i + radius + 1]);
        }
        if i >= radius {
            remove(&mut sum, &input[i - radius]);
        }
    }
}

#[inline]
fn add(sum: &mut [u32; 4], px: &Bgra8) {
    sum[0] += px.b as u32;
    sum[1] += px.g as u32;
    sum[2] += px.r as u32;
    sum[3] += px.a as u32;
}

#[inline]
fn remove(sum: &mut [u32; 4], px: &Bgra8) {
    sum[0] -= px.b as u32;
    sum[1] -= px.g as u32;
    sum[2] -= px.r as u32;
    sum[3] -= px.a as u32;
}

fn accumulate(sums: &mut [[u32; 4]], row: &[Bgra8]) {
    for (sum, px) in sums.iter_mut().zip(row) {
        add(sum, px);
    }
}

fn subtract(sums: &mut [[u32; 4]], row: &[Bgra8]) {
    for (sum, px) in sums.iter_mut().zip(row) {
        remove(sum, px);
    }
}

/// Rounded mean of the accumulated channels.
#[inline]
fn average(sum: &[u32; 4], count: u32) -> Bgra8 {
    let mean = |s: u32| ((s + count / 2) / count) as u8;
    Bgra8::new(mean(sum[0]), mean(sum[1]), mean(sum[2]), mean(sum[3]))
}
