use image::{GrayImage, Luma, RgbImage};

use crate::config::HsvRange;

const FOREGROUND: Luma<u8> = Luma([255]);

/// Convert one RGB pixel to 8-bit HSV with hue halved into 0..=180
/// (the OpenCV `COLOR_RGB2HSV` encoding).
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v == 0.0 { 0.0 } else { 255.0 * delta / v };

    let h = if delta == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / delta
    } else if v == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [
        (h / 2.0).round().min(180.0) as u8,
        s.round() as u8,
        v as u8,
    ]
}

/// Binary mask of pixels whose HSV color lies inside any of `ranges`.
/// An empty frame yields an empty mask.
pub fn segment_wood(frame: &RgbImage, ranges: &[HsvRange]) -> GrayImage {
    let mut mask = GrayImage::new(frame.width(), frame.height());

    for (x, y, pixel) in frame.enumerate_pixels() {
        let hsv = rgb_to_hsv(pixel.0);
        if ranges.iter().any(|range| range.contains(hsv)) {
            mask.put_pixel(x, y, FOREGROUND);
        }
    }

    mask
}

pub fn foreground_pixels(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p[0] > 0).count() as u64
}
