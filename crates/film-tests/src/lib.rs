//! Integration tests for the film emulation crates.
//!
//! End-to-end scenarios live in `tests/`; this library holds the frame
//! generators they share, plus cross-crate checks that need no pipeline.

use film_core::{ChannelOrder, Image, Plane, Result};

/// Uniform 8-bit frame, interleaved in `order`.
pub fn uniform_u8(width: usize, height: usize, rgb: [u8; 3], order: ChannelOrder) -> Vec<u8> {
    let px = match order {
        ChannelOrder::Rgb => rgb,
        ChannelOrder::Bgr => [rgb[2], rgb[1], rgb[0]],
    };
    px.iter().copied().cycle().take(width * height * 3).collect()
}

/// Dark frame with one bright square in the middle.
pub fn bright_square(size: usize, half: usize, background: f32, peak: f32) -> Result<Image> {
    let mut data = vec![background; size * size * 3];
    let c = size / 2;
    for y in c - half..c + half {
        for x in c - half..c + half {
            let i = (y * size + x) * 3;
            data[i..i + 3].copy_from_slice(&[peak; 3]);
        }
    }
    Image::from_vec(size, size, 3, data)
}

/// Horizontal grey ramp from 0 to 1.
pub fn grey_ramp(width: usize, height: usize) -> Result<Image> {
    let row: Vec<f32> = (0..width)
        .map(|x| x as f32 / (width.max(2) - 1) as f32)
        .collect();
    let plane = Plane::from_vec(width, height, row.repeat(height))?;
    Image::from_planes(&[plane.clone(), plane.clone(), plane])
}

/// Mean of the samples in a ring `[r0, r1]` around `(cx, cy)`.
pub fn ring_mean(plane: &Plane, cx: f32, cy: f32, r0: f32, r1: f32) -> f64 {
    let (mut sum, mut n) = (0.0, 0usize);
    for y in 0..plane.height() {
        for x in 0..plane.width() {
            let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            if (r0..=r1).contains(&d) {
                sum += plane.get(x, y) as f64;
                n += 1;
            }
        }
    }
    if n == 0 { 0.0 } else { sum / n as f64 }
}
