use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_CM_PER_PIXEL;
use crate::error::CalibrationError;
use crate::models::PixelPoint;

/// Pixel-to-centimeter scale handed into every pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub cm_per_pixel: f64,
    /// Whether `cm_per_pixel` came from a real calibration rather than the
    /// placeholder default.
    pub calibrated: bool,
}

impl Calibration {
    pub fn uncalibrated(placeholder_cm_per_pixel: f64) -> Self {
        Self {
            cm_per_pixel: placeholder_cm_per_pixel,
            calibrated: false,
        }
    }

    /// Scale known from elsewhere (e.g. a previous session)
    pub fn from_cm_per_pixel(cm_per_pixel: f64) -> Result<Self, CalibrationError> {
        if !cm_per_pixel.is_finite() || cm_per_pixel <= 0.0 {
            return Err(CalibrationError::InvalidScale(cm_per_pixel));
        }
        Ok(Self { cm_per_pixel, calibrated: true })
    }

    /// Derive the scale from two points spanning a reference of `reference_cm`.
    pub fn from_reference(
        first: PixelPoint,
        second: PixelPoint,
        reference_cm: f64,
    ) -> Result<Self, CalibrationError> {
        if !reference_cm.is_finite() || reference_cm <= 0.0 {
            return Err(CalibrationError::InvalidReferenceLength(reference_cm));
        }

        let pixel_distance = first.distance_to(&second);
        if !(pixel_distance > 0.0) {
            return Err(CalibrationError::CoincidentPoints);
        }

        // Non-finite points or extreme ratios can still underflow to 0 or overflow.
        Self::from_cm_per_pixel(reference_cm / pixel_distance)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::uncalibrated(DEFAULT_CM_PER_PIXEL)
    }
}

/// Snapshot for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationStatus {
    pub calibrated: bool,
    pub cm_per_pixel: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationState {
    Idle,
    AwaitingFirstPoint { reference_cm: f64 },
    AwaitingSecondPoint { reference_cm: f64, first: PixelPoint },
}

/// Result of feeding one point into the calibration cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationProgress {
    /// No cycle in flight; the point was dropped.
    Ignored,
    FirstPointRecorded(PixelPoint),
    Calibrated(Calibration),
}

/// Two-click calibration cycle: `Idle → AwaitingFirstPoint →
/// AwaitingSecondPoint → Idle`.
#[derive(Debug, Clone)]
pub struct CalibrationManager {
    state: CalibrationState,
    current: Calibration,
}

impl CalibrationManager {
    pub fn new(initial: Calibration) -> Self {
        Self {
            state: CalibrationState::Idle,
            current: initial,
        }
    }

    /// Start (or restart) a cycle. Pending points from an earlier cycle are
    /// discarded.
    pub fn begin(&mut self, reference_cm: f64) -> Result<(), CalibrationError> {
        if !reference_cm.is_finite() || reference_cm <= 0.0 {
            self.state = CalibrationState::Idle;
            return Err(CalibrationError::InvalidReferenceLength(reference_cm));
        }
        if self.state != CalibrationState::Idle {
            info!("Restarting calibration; pending points discarded");
        }
        self.state = CalibrationState::AwaitingFirstPoint { reference_cm };
        Ok(())
    }

    pub fn report_point(
        &mut self,
        point: PixelPoint,
    ) -> Result<CalibrationProgress, CalibrationError> {
        match self.state {
            CalibrationState::Idle => Ok(CalibrationProgress::Ignored),
            CalibrationState::AwaitingFirstPoint { reference_cm } => {
                self.state = CalibrationState::AwaitingSecondPoint { reference_cm, first: point };
                Ok(CalibrationProgress::FirstPointRecorded(point))
            }
            CalibrationState::AwaitingSecondPoint { reference_cm, first } => {
                self.state = CalibrationState::Idle;
                match Calibration::from_reference(first, point, reference_cm) {
                    Ok(calibration) => {
                        info!(
                            "Calibrated: 1 pixel = {:.4} cm (reference {} cm = {:.1} px)",
                            calibration.cm_per_pixel,
                            reference_cm,
                            first.distance_to(&point)
                        );
                        self.current = calibration;
                        Ok(CalibrationProgress::Calibrated(calibration))
                    }
                    Err(e) => {
                        warn!("Calibration rejected: {}", e);
                        Err(e)
                    }
                }
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = CalibrationState::Idle;
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn calibration(&self) -> &Calibration {
        &self.current
    }

    pub fn status(&self) -> CalibrationStatus {
        CalibrationStatus {
            calibrated: self.current.calibrated,
            cm_per_pixel: self.current.cm_per_pixel,
        }
    }
}

impl Default for CalibrationManager {
    fn default() -> Self {
        Self::new(Calibration::default())
    }
}
