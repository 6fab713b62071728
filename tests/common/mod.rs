#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from treemeasure for tests
pub use treemeasure::{
    Calibration, CalibrationError, CalibrationManager, CalibrationProgress, CalibrationState,
    Detection, MeasureConfig, MeasurementSession, PixelPoint, SessionEvent, SessionOutput,
    TrunkDetector,
};
