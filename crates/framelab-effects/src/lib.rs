//! FrameLab Effects - CPU pixel effects on raw BGRA frames
//!
//! Provides color-matrix adjustments (brightness/contrast/saturation,
//! grayscale, sepia, invert), multi-pass box blur, Sobel edge detection and
//! aspect-preserving resize. Every operation reads an immutable
//! [`PixelBuffer`] and returns a new one; work inside an operation is spread
//! across rayon workers with disjoint writes.
//!
//! Operations take a `&dyn Stop` and check it between stages. A cancelled
//! operation returns [`FrameLabError::Cancelled`] and no partial output.

pub mod blur;
pub mod color_matrix;
pub mod edges;
mod raster;
pub mod resize;

#[cfg(test)]
mod properties;

pub use blur::blur;
pub use color_matrix::{adjust, grayscale, invert, sepia, ColorMatrix};
pub use edges::detect_edges;
pub use enough::{Stop, StopReason, Unstoppable};
pub use resize::{fit_dimensions, resize};

use framelab_core::{AdjustmentParams, FrameLabError, PixelBuffer, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Map a fired stop token to [`FrameLabError::Cancelled`].
pub(crate) fn checkpoint(stop: &dyn Stop, stage: &str) -> Result<()> {
    stop.check().map_err(|reason| {
        debug!(stage, ?reason, "Operation cancelled");
        FrameLabError::Cancelled
    })
}

/// Apply slider adjustments followed by the blur, as an editor preview does.
pub fn apply_adjustments(
    src: &PixelBuffer,
    params: &AdjustmentParams,
    stop: &dyn Stop,
) -> Result<PixelBuffer> {
    if params.is_identity() {
        return Ok(src.clone());
    }
    let adjusted = if params.brightness == 0.0 && params.contrast == 0.0 && params.saturation == 0.0 {
        src.clone()
    } else {
        adjust(src, params.brightness, params.contrast, params.saturation, stop)?
    };
    blur(&adjusted, params.clamped_blur_radius(), stop)
}

/// Effect parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f32),
    Int(i32),
}

impl ParamValue {
    pub fn as_f32(self) -> f32 {
        match self {
            Self::Float(v) => v,
            Self::Int(v) => v as f32,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Self::Float(v) => v.round() as i32,
            Self::Int(v) => v,
        }
    }
}

/// Effect parameter descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,
    pub display_name: String,
    pub default: ParamValue,
    pub min: Option<ParamValue>,
    pub max: Option<ParamValue>,
}

impl ParamDescriptor {
    fn new(name: &str, display_name: &str, default: ParamValue, min: ParamValue, max: ParamValue) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            default,
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Collection of parameter values.
pub type ParamValues = std::collections::HashMap<String, ParamValue>;

/// Trait for frame effects.
pub trait FrameEffect: Send + Sync {
    /// Get the effect name.
    fn name(&self) -> &str;

    /// Get parameter descriptors.
    fn params(&self) -> &[ParamDescriptor] {
        &[]
    }

    /// Apply the effect, producing a new buffer.
    fn apply(&self, input: &PixelBuffer, params: &ParamValues, stop: &dyn Stop) -> Result<PixelBuffer>;

    /// Value of `name`, falling back to the descriptor default.
    fn param(&self, params: &ParamValues, name: &str) -> ParamValue {
        params.get(name).copied().unwrap_or_else(|| {
            self.params()
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.default)
                .unwrap_or(ParamValue::Int(0))
        })
    }
}

/// Built-in effects registry.
pub struct EffectsRegistry {
    effects: Vec<Box<dyn FrameEffect>>,
}

impl EffectsRegistry {
    /// Create a new registry with built-in effects.
    pub fn new() -> Self {
        Self {
            effects: vec![
                Box::new(AdjustEffect::new()),
                Box::new(MatrixEffect::new("Grayscale", ColorMatrix::grayscale())),
                Box::new(MatrixEffect::new("Sepia", ColorMatrix::sepia())),
                Box::new(MatrixEffect::new("Invert", ColorMatrix::invert())),
                Box::new(BlurEffect::new()),
                Box::new(EdgeDetectEffect),
                Box::new(ResizeEffect::new()),
            ],
        }
    }

    /// Get all registered effects.
    pub fn effects(&self) -> &[Box<dyn FrameEffect>] {
        &self.effects
    }

    /// Find an effect by name, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<&dyn FrameEffect> {
        self.effects
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
            .map(|e| &**e)
    }

    /// Add a custom effect. Later registrations do not shadow earlier ones.
    pub fn register(&mut self, effect: Box<dyn FrameEffect>) {
        self.effects.push(effect);
    }
}

impl Default for EffectsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Built-in effect adapters
// ---------------------------------------------------------------------------

/// Brightness/contrast/saturation adjustment.
pub struct AdjustEffect {
    params: Vec<ParamDescriptor>,
}

impl Default for AdjustEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl AdjustEffect {
    pub fn new() -> Self {
        let slider = |name: &str, display: &str| {
            ParamDescriptor::new(
                name,
                display,
                ParamValue::Float(0.0),
                ParamValue::Float(-100.0),
                ParamValue::Float(100.0),
            )
        };
        Self {
            params: vec![
                slider("brightness", "Brightness"),
                slider("contrast", "Contrast"),
                slider("saturation", "Saturation"),
            ],
        }
    }
}

impl FrameEffect for AdjustEffect {
    fn name(&self) -> &str {
        "Adjust"
    }

    fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    fn apply(&self, input: &PixelBuffer, params: &ParamValues, stop: &dyn Stop) -> Result<PixelBuffer> {
        adjust(
            input,
            self.param(params, "brightness").as_f32(),
            self.param(params, "contrast").as_f32(),
            self.param(params, "saturation").as_f32(),
            stop,
        )
    }
}

/// A fixed color matrix with no parameters.
pub struct MatrixEffect {
    name: &'static str,
    matrix: ColorMatrix,
}

impl MatrixEffect {
    pub fn new(name: &'static str, matrix: ColorMatrix) -> Self {
        Self { name, matrix }
    }
}

impl FrameEffect for MatrixEffect {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, input: &PixelBuffer, _params: &ParamValues, stop: &dyn Stop) -> Result<PixelBuffer> {
        self.matrix.apply(input, stop)
    }
}

/// Multi-pass box blur.
pub struct BlurEffect {
    params: Vec<ParamDescriptor>,
}

impl Default for BlurEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl BlurEffect {
    pub fn new() -> Self {
        Self {
            params: vec![ParamDescriptor::new(
                "radius",
                "Radius",
                ParamValue::Int(2),
                ParamValue::Int(0),
                ParamValue::Int(framelab_core::MAX_BLUR_RADIUS),
            )],
        }
    }
}

impl FrameEffect for BlurEffect {
    fn name(&self) -> &str {
        "Blur"
    }

    fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    fn apply(&self, input: &PixelBuffer, params: &ParamValues, stop: &dyn Stop) -> Result<PixelBuffer> {
        blur(input, self.param(params, "radius").as_i32(), stop)
    }
}

/// Sobel edge detection.
pub struct EdgeDetectEffect;

impl FrameEffect for EdgeDetectEffect {
    fn name(&self) -> &str {
        "Edges"
    }

    fn apply(&self, input: &PixelBuffer, _params: &ParamValues, stop: &dyn Stop) -> Result<PixelBuffer> {
        detect_edges(input, stop)
    }
}

/// Fit-inside resize.
pub struct ResizeEffect {
    params: Vec<ParamDescriptor>,
}

impl Default for ResizeEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl ResizeEffect {
    pub fn new() -> Self {
        let bound = |name: &str, display: &str| {
            ParamDescriptor::new(
                name,
                display,
                ParamValue::Int(1024),
                ParamValue::Int(1),
                ParamValue::Int(u16::MAX as i32),
            )
        };
        Self {
            params: vec![bound("max_width", "Max Width"), bound("max_height", "Max Height")],
        }
    }
}

impl FrameEffect for ResizeEffect {
    fn name(&self) -> &str {
        "Resize"
    }

    fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    fn apply(&self, input: &PixelBuffer, params: &ParamValues, stop: &dyn Stop) -> Result<PixelBuffer> {
        let bound = |name: &str| -> Result<u32> {
            let value = self.param(params, name).as_i32();
            u32::try_from(value)
                .map_err(|_| FrameLabError::InvalidArgument(format!("{name} must be positive, got {value}")))
        };
        resize(input, bound("max_width")?, bound("max_height")?, stop)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use framelab_core::Bgra8;

    /// Stop token that is already cancelled.
    struct Cancelled;

    impl Stop for Cancelled {
        fn check(&self) -> std::result::Result<(), StopReason> {
            Err(StopReason::Cancelled)
        }
    }

    #[test]
    fn registry_contains_builtin_effects() {
        let registry = EffectsRegistry::new();
        let names: Vec<&str> = registry.effects().iter().map(|e| e.name()).collect();
        for expected in ["Adjust", "Grayscale", "Sepia", "Invert", "Blur", "Edges", "Resize"] {
            assert!(
                names.contains(&expected),
                "Registry should contain {expected}, got: {names:?}"
            );
        }
    }

    #[test]
    fn registry_find_by_name() {
        let registry = EffectsRegistry::new();
        let blur = registry.find("blur");
        assert!(blur.is_some(), "Should find Blur ignoring case");
        assert_eq!(blur.unwrap().name(), "Blur");

        assert!(registry.find("Nonexistent Effect").is_none());
    }

    #[test]
    fn blur_effect_uses_default_radius() {
        let registry = EffectsRegistry::new();
        let frame = PixelBuffer::test_pattern(16, 4).unwrap();
        let via_registry = registry
            .find("Blur")
            .unwrap()
            .apply(&frame, &ParamValues::new(), &Unstoppable)
            .unwrap();
        assert_eq!(via_registry, blur(&frame, 2, &Unstoppable).unwrap());
    }

    #[test]
    fn resize_effect_rejects_negative_bounds() {
        let registry = EffectsRegistry::new();
        let frame = PixelBuffer::test_pattern(16, 4).unwrap();
        let mut params = ParamValues::new();
        params.insert("max_width".into(), ParamValue::Int(-5));
        let err = registry
            .find("Resize")
            .unwrap()
            .apply(&frame, &params, &Unstoppable)
            .unwrap_err();
        assert!(matches!(err, FrameLabError::InvalidArgument(_)));
    }

    #[test]
    fn adjust_effect_reads_params() {
        let registry = EffectsRegistry::new();
        let frame = PixelBuffer::filled(2, 2, Bgra8::gray(100)).unwrap();
        let mut params = ParamValues::new();
        params.insert("brightness".into(), ParamValue::Float(-100.0));
        let out = registry
            .find("Adjust")
            .unwrap()
            .apply(&frame, &params, &Unstoppable)
            .unwrap();
        assert_eq!(out.pixel(0, 0), Some(Bgra8::new(0, 0, 0, 255)));
    }

    #[test]
    fn apply_adjustments_identity_returns_copy() {
        let frame = PixelBuffer::test_pattern(8, 8).unwrap();
        let out = apply_adjustments(&frame, &AdjustmentParams::default(), &Unstoppable).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn cancelled_operations_produce_no_buffer() {
        let frame = PixelBuffer::test_pattern(8, 8).unwrap();
        assert!(matches!(blur(&frame, 3, &Cancelled), Err(FrameLabError::Cancelled)));
        assert!(matches!(detect_edges(&frame, &Cancelled), Err(FrameLabError::Cancelled)));
        assert!(matches!(resize(&frame, 4, 4, &Cancelled), Err(FrameLabError::Cancelled)));
        assert!(matches!(grayscale(&frame, &Cancelled), Err(FrameLabError::Cancelled)));
    }

    #[test]
    fn zero_radius_blur_ignores_cancellation() {
        let frame = PixelBuffer::test_pattern(8, 8).unwrap();
        assert_eq!(blur(&frame, 0, &Cancelled).unwrap(), frame);
    }
}
