//! Row-parallel helpers shared by the pixel operations.
//!
//! Every helper reads a frozen source and writes into a freshly allocated
//! destination with the same stride, one row per rayon work item.

use framelab_core::{Bgra8, FrameLabError, PixelBuffer, Result};
use rayon::prelude::*;

/// Build a new buffer by mapping each source row into the matching
/// destination row. Padding bytes in the output are zero.
pub(crate) fn map_rows<F>(src: &PixelBuffer, f: F) -> Result<PixelBuffer>
where
    F: Fn(u32, &[Bgra8], &mut [Bgra8]) + Sync,
{
    let stride = src.stride() as usize;
    let row_bytes = src.row_bytes();
    let mut out = vec![0u8; src.as_bytes().len()];

    out.par_chunks_mut(stride)
        .zip(src.as_bytes().par_chunks(stride))
        .enumerate()
        .for_each(|(y, (dst, input))| {
            let input: &[Bgra8] = bytemuck::cast_slice(&input[..row_bytes]);
            let dst: &mut [Bgra8] = bytemuck::cast_slice_mut(&mut dst[..row_bytes]);
            f(y as u32, input, dst);
        });

    rebuild(src.width(), src.height(), src.stride(), out)
}

/// Wrap bytes produced by an operation. A geometry mismatch here is an
/// internal fault, not a caller error.
pub(crate) fn rebuild(width: u32, height: u32, stride: u32, bytes: Vec<u8>) -> Result<PixelBuffer> {
    PixelBuffer::from_raw(width, height, stride, bytes)
        .map_err(|e| FrameLabError::TransformFailure(e.to_string()))
}

/// View row `y` of a raw byte plane as pixels.
#[inline]
pub(crate) fn row_pixels(bytes: &[u8], y: usize, stride: usize, width: usize) -> &[Bgra8] {
    let start = y * stride;
    bytemuck::cast_slice(&bytes[start..start + width * 4])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_rows_passes_row_index() {
        let src = PixelBuffer::new(3, 5).unwrap();
        let out = map_rows(&src, |y, _, dst| {
            for px in dst.iter_mut() {
                *px = Bgra8::gray(y as u8 * 10);
            }
        })
        .unwrap();
        for y in 0..5 {
            assert_eq!(out.pixel(2, y), Some(Bgra8::gray(y as u8 * 10)));
        }
    }

    #[test]
    fn test_rebuild_reports_transform_failure() {
        let err = rebuild(2, 2, 8, vec![0; 3]).unwrap_err();
        assert!(matches!(err, FrameLabError::TransformFailure(_)));
    }
}
