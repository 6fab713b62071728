use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};

use crate::config::{KernelShape, MAX_KERNEL_SIZE};

/// Opening with `open_kernel` drops speckles smaller than the kernel, then
/// closing with `close_kernel` fills small holes and bridges nearby fragments.
///
/// Kernel sizes are full widths (odd, 3..=511, checked by
/// `MeasureConfig::validate`); the structuring element has radius `size / 2`.
pub fn refine_mask(
    mask: &GrayImage,
    open_kernel: u32,
    close_kernel: u32,
    shape: KernelShape,
) -> GrayImage {
    if mask.width() == 0 || mask.height() == 0 {
        return mask.clone();
    }

    let norm = match shape {
        KernelShape::Ellipse => Norm::L2,
        KernelShape::Rectangle => Norm::LInf,
    };

    let opened = open(mask, norm, kernel_radius(open_kernel));
    close(&opened, norm, kernel_radius(close_kernel))
}

fn kernel_radius(size: u32) -> u8 {
    debug_assert!(size <= MAX_KERNEL_SIZE, "kernel {} exceeds {}", size, MAX_KERNEL_SIZE);
    (size / 2).min(u8::MAX as u32) as u8
}
