pub mod calibration;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod session;

pub use calibration::{Calibration, CalibrationManager, CalibrationProgress, CalibrationState, CalibrationStatus};
pub use config::{HsvRange, KernelShape, MeasureConfig};
pub use detection::TrunkDetector;
pub use error::{CalibrationError, ConfigError};
pub use models::{BoundingBox, Contour, Detection, Measurement, PixelPoint};
pub use pipeline::{
    Pipeline, PipelineData, PipelineStep, PipelineContext,
    MetadataValue, DebugConfig
};
pub use session::{MeasurementSession, SessionEvent, SessionHandle, SessionOutput};
