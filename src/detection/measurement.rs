use std::f64::consts::PI;

use crate::calibration::Calibration;
use crate::models::{BoundingBox, Measurement};

/// Constants of the cylinder model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeModel {
    pub lumber_piece_volume_cm3: f64,
    pub wood_density_g_per_cm3: Option<f64>,
}

/// Convert a trunk bounding box into physical units.
///
/// Bounding-box width stands in for diameter and height for trunk length;
/// volume is that of the enclosing right circular cylinder.
pub fn measure_trunk(
    bbox: BoundingBox,
    contour_area_px: f64,
    calibration: &Calibration,
    model: &VolumeModel,
) -> Measurement {
    let diameter_cm = bbox.width as f64 * calibration.cm_per_pixel;
    let height_cm = bbox.height as f64 * calibration.cm_per_pixel;
    let radius_cm = diameter_cm / 2.0;
    let volume_cm3 = PI * radius_cm * radius_cm * height_cm;

    // grams to kilograms
    let weight_kg = model
        .wood_density_g_per_cm3
        .map(|density| volume_cm3 * density / 1000.0);

    Measurement {
        diameter_cm,
        height_cm,
        volume_cm3,
        weight_kg,
        lumber_count: lumber_pieces(volume_cm3, model.lumber_piece_volume_cm3),
        bbox,
        contour_area_px,
        calibrated: calibration.calibrated,
    }
}

/// Number of lumber pieces (fractional) carried by `volume_cm3`, never negative
pub fn lumber_pieces(volume_cm3: f64, piece_volume_cm3: f64) -> f64 {
    (volume_cm3 / piece_volume_cm3).max(0.0)
}
