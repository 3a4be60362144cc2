//! FrameLab Core - Foundation types for frame editing
//!
//! This crate provides the fundamental types used throughout FrameLab:
//! - Raw BGRA pixel buffers
//! - Adjustment parameters
//! - The shared error type

pub mod error;
pub mod frame;
pub mod params;

pub use error::{FrameLabError, Result};
pub use frame::{Bgra8, PixelBuffer, SharedPixelBuffer, BYTES_PER_PIXEL};
pub use params::{AdjustmentParams, MAX_BLUR_RADIUS};
