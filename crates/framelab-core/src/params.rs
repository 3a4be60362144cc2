//! Adjustment parameters carried alongside edits and history snapshots.

use serde::{Deserialize, Serialize};

/// Largest blur radius the engine honours.
pub const MAX_BLUR_RADIUS: i32 = 10;

/// Slider values for an edit. Brightness, contrast and saturation are only
/// meaningful in `-100.0..=100.0`; values outside that range are not
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdjustmentParams {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub blur_radius: i32,
}

impl AdjustmentParams {
    pub fn new(brightness: f32, contrast: f32, saturation: f32, blur_radius: i32) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
            blur_radius,
        }
    }

    /// Blur radius clamped to `0..=MAX_BLUR_RADIUS`.
    pub fn clamped_blur_radius(&self) -> i32 {
        self.blur_radius.clamp(0, MAX_BLUR_RADIUS)
    }

    /// Whether applying these parameters leaves a frame unchanged.
    pub fn is_identity(&self) -> bool {
        self.brightness == 0.0
            && self.contrast == 0.0
            && self.saturation == 0.0
            && self.clamped_blur_radius() == 0
    }
}
