//! Pixel buffers for raw 8-bit BGRA frames in CPU memory.
//!
//! A [`PixelBuffer`] is immutable once built: every transform in the
//! workspace allocates a fresh buffer instead of writing into its input.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{FrameLabError, Result};

/// Bytes per pixel for the fixed BGRA layout.
pub const BYTES_PER_PIXEL: usize = 4;

/// One BGRA pixel, laid out exactly as it sits in a frame row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Bgra8 {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Bgra8 {
    #[inline]
    pub const fn new(b: u8, g: u8, r: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Build from RGBA-ordered components.
    #[inline]
    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Opaque pixel with equal R, G and B.
    #[inline]
    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v, 255)
    }

    /// Components in RGBA order.
    #[inline]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A raw frame: `height` rows of `stride` bytes, each row holding `width`
/// BGRA pixels followed by optional padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    stride: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Create a zeroed buffer with a packed stride (`width * 4`).
    pub fn new(width: u32, height: u32) -> Result<Self> {
        check_dimensions(width, height)?;
        let stride = packed_stride(width)?;
        Ok(Self {
            width,
            height,
            stride,
            pixels: vec![0u8; stride as usize * height as usize],
        })
    }

    /// Wrap existing bytes, validating the geometry.
    pub fn from_raw(width: u32, height: u32, stride: u32, pixels: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        let min_stride = packed_stride(width)?;
        if stride < min_stride {
            return Err(FrameLabError::InvalidArgument(format!(
                "stride {stride} is smaller than width * 4 ({min_stride})"
            )));
        }
        let expected = stride as usize * height as usize;
        if pixels.len() != expected {
            return Err(FrameLabError::InvalidArgument(format!(
                "pixel data is {} bytes, expected {expected} for {width}x{height} with stride {stride}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            pixels,
        })
    }

    /// Wrap tightly packed BGRA bytes.
    pub fn from_packed(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let stride = packed_stride(width)?;
        Self::from_raw(width, height, stride, pixels)
    }

    /// Zeroed buffer with the same width, height and stride as `other`.
    pub fn zeroed_like(other: &Self) -> Self {
        Self {
            width: other.width,
            height: other.height,
            stride: other.stride,
            pixels: vec![0u8; other.pixels.len()],
        }
    }

    /// Buffer filled with a single pixel value.
    pub fn filled(width: u32, height: u32, pixel: Bgra8) -> Result<Self> {
        let mut buffer = Self::new(width, height)?;
        for px in bytemuck::cast_slice_mut::<u8, Bgra8>(&mut buffer.pixels) {
            *px = pixel;
        }
        Ok(buffer)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row, including padding.
    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// All bytes, padding included.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume the buffer, returning the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    /// Length of the pixel portion of a row in bytes.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Pixel bytes of row `y`, without padding.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride as usize;
        &self.pixels[start..start + self.row_bytes()]
    }

    /// Row `y` viewed as pixels.
    #[inline]
    pub fn pixels_in_row(&self, y: u32) -> &[Bgra8] {
        bytemuck::cast_slice(self.row(y))
    }

    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Bgra8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels_in_row(y)[x as usize])
    }

    /// Copy the pixel rows into a tightly packed byte vector.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        if self.stride as usize == self.row_bytes() {
            return self.pixels.clone();
        }
        let mut packed = Vec::with_capacity(self.row_bytes() * self.height as usize);
        for y in 0..self.height {
            packed.extend_from_slice(self.row(y));
        }
        packed
    }

    /// Total memory usage in bytes.
    pub fn memory_size(&self) -> usize {
        self.pixels.len()
    }

    /// Create a test pattern frame (color bars).
    pub fn test_pattern(width: u32, height: u32) -> Result<Self> {
        const BARS: [Bgra8; 8] = [
            Bgra8::from_rgba(255, 255, 255, 255), // White
            Bgra8::from_rgba(255, 255, 0, 255),   // Yellow
            Bgra8::from_rgba(0, 255, 255, 255),   // Cyan
            Bgra8::from_rgba(0, 255, 0, 255),     // Green
            Bgra8::from_rgba(255, 0, 255, 255),   // Magenta
            Bgra8::from_rgba(255, 0, 0, 255),     // Red
            Bgra8::from_rgba(0, 0, 255, 255),     // Blue
            Bgra8::from_rgba(0, 0, 0, 255),       // Black
        ];

        let mut frame = Self::new(width, height)?;
        let stride = frame.stride as usize;
        let row_bytes = frame.row_bytes();
        for row in frame.pixels.chunks_exact_mut(stride) {
            let row: &mut [Bgra8] = bytemuck::cast_slice_mut(&mut row[..row_bytes]);
            for (x, px) in row.iter_mut().enumerate() {
                *px = BARS[x * 8 / width as usize];
            }
        }
        Ok(frame)
    }
}

/// Arc-wrapped pixel buffer for shared ownership across threads.
pub type SharedPixelBuffer = Arc<PixelBuffer>;

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(FrameLabError::InvalidArgument(format!(
            "frame dimensions must be non-zero, got {width}x{height}"
        )));
    }
    Ok(())
}

fn packed_stride(width: u32) -> Result<u32> {
    width.checked_mul(BYTES_PER_PIXEL as u32).ok_or_else(|| {
        FrameLabError::InvalidArgument(format!("width {width} overflows the row stride"))
    })
}
