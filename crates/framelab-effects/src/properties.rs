//! Property tests for the pixel operations.

use framelab_core::{Bgra8, PixelBuffer};
use proptest::prelude::*;

use crate::{blur, detect_edges, fit_dimensions, grayscale, invert, Unstoppable};

/// Frames up to 24x24 with up to three pixels of row padding.
fn arb_frame() -> impl Strategy<Value = PixelBuffer> {
    (1u32..24, 1u32..24, 0u32..4).prop_flat_map(|(width, height, pad)| {
        let stride = (width + pad) * 4;
        proptest::collection::vec(any::<u8>(), (stride * height) as usize)
            .prop_map(move |bytes| PixelBuffer::from_raw(width, height, stride, bytes).unwrap())
    })
}

fn pixels(frame: &PixelBuffer) -> Vec<Bgra8> {
    (0..frame.height())
        .flat_map(|y| frame.pixels_in_row(y).to_vec())
        .collect()
}

proptest! {
    #[test]
    fn zero_radius_blur_is_identity(frame in arb_frame()) {
        prop_assert_eq!(blur(&frame, 0, &Unstoppable).unwrap(), frame);
    }

    #[test]
    fn double_invert_restores_frame(frame in arb_frame()) {
        let twice = invert(&invert(&frame, &Unstoppable).unwrap(), &Unstoppable).unwrap();
        for (a, b) in pixels(&frame).iter().zip(pixels(&twice).iter()) {
            prop_assert!((a.r as i32 - b.r as i32).abs() <= 1);
            prop_assert!((a.g as i32 - b.g as i32).abs() <= 1);
            prop_assert!((a.b as i32 - b.b as i32).abs() <= 1);
            prop_assert_eq!(a.a, b.a);
        }
    }

    #[test]
    fn grayscale_is_idempotent(frame in arb_frame()) {
        let once = grayscale(&frame, &Unstoppable).unwrap();
        let twice = grayscale(&once, &Unstoppable).unwrap();
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn blur_stays_within_source_range(frame in arb_frame(), radius in 1i32..12) {
        let src = pixels(&frame);
        let out = pixels(&blur(&frame, radius, &Unstoppable).unwrap());
        let channels: [fn(&Bgra8) -> u8; 4] = [|p| p.b, |p| p.g, |p| p.r, |p| p.a];
        for channel in channels {
            let lo = src.iter().map(channel).min().unwrap();
            let hi = src.iter().map(channel).max().unwrap();
            prop_assert!(out.iter().map(channel).all(|v| v >= lo && v <= hi));
        }
    }

    #[test]
    fn edge_output_is_opaque_inside_and_zero_on_border(frame in arb_frame()) {
        let out = detect_edges(&frame, &Unstoppable).unwrap();
        let (w, h) = (out.width(), out.height());
        for y in 0..h {
            for x in 0..w {
                let px = out.pixel(x, y).unwrap();
                let border = x == 0 || y == 0 || x + 1 == w || y + 1 == h;
                if border {
                    prop_assert_eq!(px, Bgra8::default());
                } else {
                    prop_assert_eq!(px.a, 255);
                    prop_assert!(px.r == px.g && px.g == px.b);
                }
            }
        }
    }

    #[test]
    fn fitted_size_touches_one_bound(
        width in 1u32..5000,
        height in 1u32..5000,
        max_w in 1u32..2000,
        max_h in 1u32..2000,
    ) {
        if let Ok((new_w, new_h)) = fit_dimensions(width, height, max_w, max_h) {
            prop_assert!(new_w <= max_w && new_h <= max_h);
            prop_assert!(new_w == max_w || new_h == max_h);
        }
    }
}
