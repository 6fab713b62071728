pub mod segmentation;
pub mod morphology;
pub mod contours;
pub mod measurement;
pub mod steps;

use image::DynamicImage;
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::calibration::Calibration;
use crate::config::MeasureConfig;
use crate::error::ConfigError;
use crate::models::Detection;
use crate::pipeline::Pipeline;

/// Trunk measurement pipeline orchestrator
pub struct TrunkDetector {
    config: MeasureConfig,
    pipeline: Pipeline,
}

impl TrunkDetector {
    /// Validate `config` and build the four-step pipeline.
    pub fn new(config: MeasureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pipeline = build_standard_pipeline(&config);
        Ok(Self { config, pipeline })
    }

    /// Save every intermediate raster under `output_dir` (must be empty)
    pub fn with_debug(mut self, output_dir: PathBuf) -> anyhow::Result<Self> {
        self.pipeline = self.pipeline.with_debug(output_dir)?;
        Ok(self)
    }

    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }

    /// Placeholder calibration implied by the configuration
    pub fn default_calibration(&self) -> Calibration {
        Calibration::uncalibrated(self.config.default_cm_per_pixel)
    }

    /// Run one measurement cycle on `frame`.
    ///
    /// Any failure inside the pipeline is logged and reported as
    /// [`Detection::NoDetection`]; one bad frame never interrupts polling.
    pub fn run_pipeline(&self, frame: impl Into<Arc<DynamicImage>>, calibration: &Calibration) -> Detection {
        measure_frame(&self.pipeline, frame.into(), calibration)
    }
}

/// Run `pipeline` on `frame` and reduce its output to a [`Detection`].
/// Errors are logged and become [`Detection::NoDetection`].
pub fn measure_frame(pipeline: &Pipeline, frame: Arc<DynamicImage>, calibration: &Calibration) -> Detection {
    debug!("Measuring {}x{} frame", frame.width(), frame.height());

    match pipeline.run(frame, calibration) {
        Ok(results) => results
            .into_iter()
            .find_map(|data| data.measurement)
            .map_or(Detection::NoDetection, Detection::Measured),
        Err(e) => {
            warn!("Frame processing failed, reporting no detection: {:#}", e);
            Detection::NoDetection
        }
    }
}

/// Build the standard segmentation → refinement → selection → measurement pipeline
pub fn build_standard_pipeline(config: &MeasureConfig) -> Pipeline {
    use crate::detection::steps::*;

    Pipeline::new()
        .add_step(Arc::new(ColorSegmentationStep {
            ranges: config.hsv_ranges.clone(),
        }))
        .add_step(Arc::new(MaskRefinementStep {
            open_kernel: config.open_kernel,
            close_kernel: config.close_kernel,
            shape: config.kernel_shape,
        }))
        .add_step(Arc::new(ContourSelectionStep {
            min_area: config.min_contour_area,
        }))
        .add_step(Arc::new(MeasurementStep {
            model: measurement::VolumeModel {
                lumber_piece_volume_cm3: config.lumber_piece_volume_cm3,
                wood_density_g_per_cm3: config.wood_density_g_per_cm3,
            },
        }))
}
