/// Errors raised while loading or validating a [`crate::MeasureConfig`].
///
/// These are fatal at startup: they indicate a bad config file, not a bad frame.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("at least one HSV range is required")]
    NoHsvRanges,
    #[error("HSV range {index}: hue bound {value} exceeds 180")]
    HueOutOfRange { index: usize, value: u8 },
    #[error("HSV range {index}: {channel} low bound {low} is greater than high bound {high}")]
    InvertedRange {
        index: usize,
        channel: &'static str,
        low: u8,
        high: u8,
    },
    #[error("{which} kernel size must be odd and between 3 and 511 (got {size})")]
    InvalidKernel { which: &'static str, size: u32 },
    #[error("{name} must be a finite number {requirement} (got {value})")]
    InvalidValue {
        name: &'static str,
        requirement: &'static str,
        value: f64,
    },
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Calibration input rejected; the previous scale factor is kept.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("reference length must be a positive number of centimeters (got {0})")]
    InvalidReferenceLength(f64),
    #[error("scale must be a positive number of centimeters per pixel (got {0})")]
    InvalidScale(f64),
    #[error("calibration points coincide; zero pixel distance")]
    CoincidentPoints,
    #[error("no frame source is active; send a frame before calibrating")]
    NoFrameSource,
}
