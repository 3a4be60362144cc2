//! Snapshot codec: JPEG for the pixels, zlib around the JPEG stream.
//!
//! JPEG carries no alpha channel, so decoded snapshots are always opaque.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use framelab_core::{FrameLabError, PixelBuffer, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Quality the JPEG encoder uses when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// zlib level used when none is configured.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Largest width or height a JPEG stream can describe.
pub const MAX_JPEG_DIMENSION: u32 = u16::MAX as u32;

/// Codec settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
    /// zlib level, 0-9.
    pub compression_level: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl CodecConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(FrameLabError::InvalidArgument(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.compression_level > 9 {
            return Err(FrameLabError::InvalidArgument(format!(
                "compression_level must be in 0..=9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}

/// Lossy frame encoder with a lossless outer wrapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotCodec {
    config: CodecConfig,
}

impl SnapshotCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Compress a frame. The result is never empty.
    pub fn encode(&self, frame: &PixelBuffer) -> Result<Vec<u8>> {
        if frame.width() > MAX_JPEG_DIMENSION || frame.height() > MAX_JPEG_DIMENSION {
            return Err(FrameLabError::Encoder(format!(
                "{}x{} exceeds the JPEG limit of {MAX_JPEG_DIMENSION}",
                frame.width(),
                frame.height()
            )));
        }

        let mut rgb = Vec::with_capacity(frame.width() as usize * frame.height() as usize * 3);
        for y in 0..frame.height() {
            for px in frame.pixels_in_row(y) {
                rgb.extend_from_slice(&px.to_rgba()[..3]);
            }
        }

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.config.jpeg_quality)
            .encode(&rgb, frame.width(), frame.height(), ExtendedColorType::Rgb8)
            .map_err(|e| FrameLabError::Encoder(format!("JPEG encode failed: {e}")))?;

        let mut zlib = ZlibEncoder::new(
            Vec::with_capacity(jpeg.len()),
            Compression::new(self.config.compression_level),
        );
        zlib.write_all(&jpeg)?;
        let packed = zlib.finish()?;

        debug!(
            width = frame.width(),
            height = frame.height(),
            jpeg_bytes = jpeg.len(),
            packed_bytes = packed.len(),
            "Snapshot encoded"
        );
        Ok(packed)
    }

    /// Reverse [`encode`](Self::encode). Every failure is reported as
    /// [`FrameLabError::CorruptEntry`].
    pub fn decode(&self, data: &[u8]) -> Result<PixelBuffer> {
        if data.is_empty() {
            return Err(FrameLabError::CorruptEntry("snapshot is empty".into()));
        }

        let mut jpeg = Vec::new();
        ZlibDecoder::new(data)
            .read_to_end(&mut jpeg)
            .map_err(|e| FrameLabError::CorruptEntry(format!("decompression failed: {e}")))?;

        let image = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg)
            .map_err(|e| FrameLabError::CorruptEntry(format!("JPEG decode failed: {e}")))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FrameLabError::CorruptEntry(format!(
                "decoded frame has no pixels ({width}x{height})"
            )));
        }

        let mut bytes = image.into_raw();
        for px in bytes.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        PixelBuffer::from_packed(width, height, bytes)
            .map_err(|e| FrameLabError::CorruptEntry(e.to_string()))
    }
}

/// Encode with the default settings.
pub fn encode(frame: &PixelBuffer) -> Result<Vec<u8>> {
    SnapshotCodec::default().encode(frame)
}

/// Decode with the default settings.
pub fn decode(data: &[u8]) -> Result<PixelBuffer> {
    SnapshotCodec::default().decode(data)
}
