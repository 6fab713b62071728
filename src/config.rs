use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Placeholder scale used before any calibration.
pub const DEFAULT_CM_PER_PIXEL: f64 = 0.1;

/// Largest odd kernel whose radius still fits the `u8` imageproc expects.
pub const MAX_KERNEL_SIZE: u32 = 511;

/// Inclusive HSV band in the 8-bit OpenCV convention
/// (hue 0..=180, saturation and value 0..=255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub hue_low: u8,
    pub hue_high: u8,
    pub sat_low: u8,
    pub sat_high: u8,
    pub val_low: u8,
    pub val_high: u8,
}

impl HsvRange {
    pub const fn new(hue: (u8, u8), sat: (u8, u8), val: (u8, u8)) -> Self {
        Self {
            hue_low: hue.0,
            hue_high: hue.1,
            sat_low: sat.0,
            sat_high: sat.1,
            val_low: val.0,
            val_high: val.1,
        }
    }

    pub fn contains(&self, [h, s, v]: [u8; 3]) -> bool {
        (self.hue_low..=self.hue_high).contains(&h)
            && (self.sat_low..=self.sat_high).contains(&s)
            && (self.val_low..=self.val_high).contains(&v)
    }
}

/// Structuring element used by the mask refiner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelShape {
    #[default]
    Ellipse,
    Rectangle,
}

/// Tunable parameters of the measurement pipeline.
///
/// Thresholds are resolution dependent; the defaults suit 640x480 frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    /// Bands treated as wood colored, combined with OR. Brown wraps around
    /// hue 0, so the default carries a band on each side of the origin.
    pub hsv_ranges: Vec<HsvRange>,
    pub open_kernel: u32,
    pub close_kernel: u32,
    pub kernel_shape: KernelShape,
    /// Contours below this polygon area (pixels²) are ignored.
    pub min_contour_area: f64,
    pub lumber_piece_volume_cm3: f64,
    /// `None` leaves weight out of the measurement.
    pub wood_density_g_per_cm3: Option<f64>,
    /// Placeholder scale used until a calibration succeeds.
    pub default_cm_per_pixel: f64,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            hsv_ranges: vec![
                HsvRange::new((0, 20), (30, 200), (20, 180)),
                HsvRange::new((160, 180), (30, 200), (20, 180)),
            ],
            open_kernel: 5,
            close_kernel: 9,
            kernel_shape: KernelShape::Ellipse,
            min_contour_area: 1000.0,
            lumber_piece_volume_cm3: 2000.0,
            wood_density_g_per_cm3: Some(0.6),
            default_cm_per_pixel: DEFAULT_CM_PER_PIXEL,
        }
    }
}

impl MeasureConfig {
    /// Parse a JSON config; keys that are absent keep their default.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hsv_ranges.is_empty() {
            return Err(ConfigError::NoHsvRanges);
        }

        for (index, range) in self.hsv_ranges.iter().enumerate() {
            for value in [range.hue_low, range.hue_high] {
                if value > 180 {
                    return Err(ConfigError::HueOutOfRange { index, value });
                }
            }
            let channels = [
                ("hue", range.hue_low, range.hue_high),
                ("saturation", range.sat_low, range.sat_high),
                ("value", range.val_low, range.val_high),
            ];
            for (channel, low, high) in channels {
                if low > high {
                    return Err(ConfigError::InvertedRange { index, channel, low, high });
                }
            }
        }

        for (which, size) in [("open", self.open_kernel), ("close", self.close_kernel)] {
            if size < 3 || size > MAX_KERNEL_SIZE || size % 2 == 0 {
                return Err(ConfigError::InvalidKernel { which, size });
            }
        }

        if !self.min_contour_area.is_finite() || self.min_contour_area < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "min_contour_area",
                requirement: ">= 0",
                value: self.min_contour_area,
            });
        }

        let mut positive = vec![
            ("lumber_piece_volume_cm3", self.lumber_piece_volume_cm3),
            ("default_cm_per_pixel", self.default_cm_per_pixel),
        ];
        if let Some(density) = self.wood_density_g_per_cm3 {
            positive.push(("wood_density_g_per_cm3", density));
        }
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue { name, requirement: "> 0", value });
            }
        }

        Ok(())
    }
}
