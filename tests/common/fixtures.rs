use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use treemeasure::{MeasureConfig, TrunkDetector};

/// Bark brown: HSV (15, 170, 120) in the 0..180 hue convention
pub const BARK: Rgb<u8> = Rgb([120, 80, 40]);
pub const SKY: Rgb<u8> = Rgb([150, 190, 235]);
pub const GRASS: Rgb<u8> = Rgb([40, 160, 60]);

/// A 640x480 frame filled with `background`
pub fn blank_frame(background: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(640, 480, background)
}

/// Frame with no wood-colored pixels at all
pub fn sky_frame() -> DynamicImage {
    DynamicImage::ImageRgb8(blank_frame(SKY))
}

/// Paint a filled rectangle in place
pub fn paint_rect(frame: &mut RgbImage, x0: u32, y0: u32, width: u32, height: u32, color: Rgb<u8>) {
    for y in y0..y0 + height {
        for x in x0..x0 + width {
            frame.put_pixel(x, y, color);
        }
    }
}

/// Frame with a single `width` x `height` trunk at (x0, y0) on sky
pub fn trunk_frame(x0: u32, y0: u32, width: u32, height: u32) -> DynamicImage {
    let mut frame = blank_frame(SKY);
    paint_rect(&mut frame, x0, y0, width, height, BARK);
    DynamicImage::ImageRgb8(frame)
}

/// Same trunk as [`trunk_frame`] but as RGBA with an opaque alpha channel
pub fn trunk_frame_rgba(x0: u32, y0: u32, width: u32, height: u32) -> DynamicImage {
    let rgb = trunk_frame(x0, y0, width, height).to_rgb8();
    let rgba = RgbaImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let Rgb([r, g, b]) = *rgb.get_pixel(x, y);
        Rgba([r, g, b, 255])
    });
    DynamicImage::ImageRgba8(rgba)
}

pub fn default_detector() -> TrunkDetector {
    TrunkDetector::new(MeasureConfig::default()).expect("default config is valid")
}
