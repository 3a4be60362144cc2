//! Integration tests for the pixel operations.
//!
//! Exercises framelab-core buffers through framelab-effects.

use std::sync::atomic::{AtomicUsize, Ordering};

use framelab_core::{AdjustmentParams, Bgra8, FrameLabError, PixelBuffer};
use framelab_effects::{
    adjust, apply_adjustments, blur, detect_edges, grayscale, invert, resize, sepia, EffectsRegistry,
    ParamValue, ParamValues, Stop, StopReason, Unstoppable,
};

// ── Helpers ────────────────────────────────────────────────────

fn gradient(width: u32, height: u32) -> PixelBuffer {
    let mut bytes = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let v = ((x * 255) / width.max(1)) as u8;
            let w = ((y * 255) / height.max(1)) as u8;
            bytes.extend_from_slice(&[v, w, 255 - v, 200]);
        }
    }
    PixelBuffer::from_packed(width, height, bytes).unwrap()
}

/// Fires after `remaining` successful checks.
struct StopAfter {
    remaining: AtomicUsize,
}

impl StopAfter {
    fn new(checks: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(checks),
        }
    }
}

impl Stop for StopAfter {
    fn check(&self) -> Result<(), StopReason> {
        let left = self.remaining.load(Ordering::SeqCst);
        if left == 0 {
            return Err(StopReason::Cancelled);
        }
        self.remaining.store(left - 1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Color matrix ───────────────────────────────────────────────

#[test]
fn brightness_scenario_on_4x4() {
    let frame = gradient(4, 4);
    let out = adjust(&frame, 50.0, 0.0, 0.0, &Unstoppable).unwrap();

    for y in 0..4 {
        for x in 0..4 {
            let before = frame.pixel(x, y).unwrap();
            let after = out.pixel(x, y).unwrap();
            for (b, a) in [(before.r, after.r), (before.g, after.g), (before.b, after.b)] {
                // brightnessFactor 0.5 -> +127.5
                let expected = (b as f32 + 127.5).round().min(255.0) as u8;
                assert!((a as i32 - expected as i32).abs() <= 1, "{b} -> {a}");
            }
            assert_eq!(after.a, before.a);
        }
    }
}

#[test]
fn operations_never_touch_input() {
    let frame = gradient(12, 9);
    let copy = frame.clone();
    let _ = adjust(&frame, 30.0, 20.0, 40.0, &Unstoppable).unwrap();
    let _ = sepia(&frame, &Unstoppable).unwrap();
    let _ = blur(&frame, 4, &Unstoppable).unwrap();
    let _ = detect_edges(&frame, &Unstoppable).unwrap();
    let _ = resize(&frame, 5, 5, &Unstoppable).unwrap();
    assert_eq!(frame, copy);
}

#[test]
fn invert_twice_and_grayscale_twice() {
    let frame = gradient(10, 7);
    let twice = invert(&invert(&frame, &Unstoppable).unwrap(), &Unstoppable).unwrap();
    assert_eq!(twice, frame);

    let gray = grayscale(&frame, &Unstoppable).unwrap();
    assert_eq!(grayscale(&gray, &Unstoppable).unwrap(), gray);
}

#[test]
fn sepia_keeps_alpha() {
    let frame = gradient(6, 6);
    let out = sepia(&frame, &Unstoppable).unwrap();
    assert!(out.pixels_in_row(3).iter().all(|p| p.a == 200));
}

// ── Pipelines ──────────────────────────────────────────────────

#[test]
fn adjustments_pipeline_matches_manual_chain() {
    let frame = gradient(16, 16);
    let params = AdjustmentParams::new(10.0, 25.0, 0.0, 3);
    let piped = apply_adjustments(&frame, &params, &Unstoppable).unwrap();
    let manual = blur(
        &adjust(&frame, 10.0, 25.0, 0.0, &Unstoppable).unwrap(),
        3,
        &Unstoppable,
    )
    .unwrap();
    assert_eq!(piped, manual);
}

#[test]
fn edges_of_resized_frame() {
    let frame = gradient(64, 32);
    let small = resize(&frame, 16, 16, &Unstoppable).unwrap();
    assert_eq!((small.width(), small.height()), (16, 8));
    let edges = detect_edges(&small, &Unstoppable).unwrap();
    assert_eq!((edges.width(), edges.height()), (16, 8));
    assert_eq!(edges.pixel(0, 0), Some(Bgra8::default()));
    assert_eq!(edges.pixel(5, 4).unwrap().a, 255);
}

#[test]
fn registry_chain() {
    let registry = EffectsRegistry::new();
    let mut frame = gradient(40, 20);

    let mut resize_params = ParamValues::new();
    resize_params.insert("max_width".into(), ParamValue::Int(20));
    resize_params.insert("max_height".into(), ParamValue::Int(20));

    for (name, params) in [
        ("grayscale", ParamValues::new()),
        ("resize", resize_params),
        ("blur", ParamValues::new()),
    ] {
        frame = registry
            .find(name)
            .unwrap()
            .apply(&frame, &params, &Unstoppable)
            .unwrap();
    }
    assert_eq!((frame.width(), frame.height()), (20, 10));
}

// ── Cancellation ───────────────────────────────────────────────

#[test]
fn blur_cancelled_between_stages() {
    let frame = gradient(20, 20);
    // Three passes need six checks; allow only the first horizontal stage.
    let stop = StopAfter::new(1);
    assert!(matches!(blur(&frame, 3, &stop), Err(FrameLabError::Cancelled)));

    let stop = StopAfter::new(6);
    assert!(blur(&frame, 3, &stop).is_ok());
}

#[test]
fn edge_detection_cancelled_after_grayscale() {
    let frame = gradient(20, 20);
    // One check for the grayscale matrix, the second before Sobel fails.
    let stop = StopAfter::new(1);
    assert!(matches!(detect_edges(&frame, &stop), Err(FrameLabError::Cancelled)));
}
