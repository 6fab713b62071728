use image::DynamicImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use anyhow::Result;
use log::debug;

use crate::calibration::Calibration;
use crate::models::{Contour, Measurement};

/// Data that flows through the pipeline
/// Starts as the camera frame; steps replace the raster with masks and fill
/// in the selected contour and measurement as they go
#[derive(Clone)]
pub struct PipelineData {
    /// Frame the run started from (shared efficiently via Arc)
    pub original: Arc<DynamicImage>,

    /// Current raster (the frame itself, then a binary mask with 0/255 pixels)
    pub image: Arc<DynamicImage>,

    /// Contour chosen as the trunk, once selected
    pub contour: Option<Contour>,

    /// Physical measurement, once computed
    pub measurement: Option<Measurement>,

    /// Diagnostics (e.g., "foreground_pixels", "contour_count")
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Float(f64),
    Int(i64),
}

impl PipelineData {
    /// Create PipelineData for a full frame; the raster starts as the frame itself
    pub fn from_image(original: Arc<DynamicImage>) -> Self {
        Self {
            image: Arc::clone(&original),
            original,
            contour: None,
            measurement: None,
            metadata: HashMap::new(),
        }
    }

    /// Replace the raster, keeping everything else
    pub fn with_image(mut self, image: DynamicImage) -> Self {
        self.image = Arc::new(image);
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get metadata as float
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Float(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps for one run
#[derive(Clone)]
pub struct PipelineContext {
    pub calibration: Calibration,
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Process data and return transformed data
    /// Steps can filter (many → fewer, down to none) or transform (many → many)
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name for this step (used in logs and debug folders)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    debug: Option<DebugConfig>,
    runs: AtomicUsize,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            debug: None,
            runs: AtomicUsize::new(0),
        }
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        // Check if directory exists and is empty
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    /// Run every step on one frame
    pub fn run(&self, input: Arc<DynamicImage>, calibration: &Calibration) -> Result<Vec<PipelineData>> {
        self.run_partial(input, calibration, self.steps.len())
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial(
        &self,
        input: Arc<DynamicImage>,
        calibration: &Calibration,
        num_steps: usize,
    ) -> Result<Vec<PipelineData>> {
        let context = PipelineContext {
            calibration: *calibration,
            debug: self.debug.clone(),
        };
        let run_id = self.runs.fetch_add(1, Ordering::Relaxed) + 1;

        let mut data = vec![PipelineData::from_image(input)];
        self.save_debug_outputs(&context, "00_input", run_id, &data)?;

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            debug!("Running step: {} (processing {} items)", step.name(), data.len());

            data = step.process(data, &context)?;

            let step_dir_name = format!("{:02}_{}", step_idx + 1,
                step.name().to_lowercase().replace(' ', "_"));
            self.save_debug_outputs(&context, &step_dir_name, run_id, &data)?;

            debug!("  → {} items", data.len());
            if data.is_empty() {
                break;
            }
        }

        Ok(data)
    }

    /// Save every non-empty raster of a step into `<debug>/<step_dir>/frame_NNNN[_MM].png`
    fn save_debug_outputs(
        &self,
        context: &PipelineContext,
        step_dir_name: &str,
        run_id: usize,
        data: &[PipelineData],
    ) -> Result<()> {
        let Some(debug_config) = &context.debug else {
            return Ok(());
        };

        let step_dir = debug_config.output_dir.join(step_dir_name);
        std::fs::create_dir_all(&step_dir)?;

        for (idx, item) in data.iter().enumerate() {
            if item.image.width() == 0 || item.image.height() == 0 {
                continue;
            }
            let filename = debug_filename(run_id, idx, data.len());
            save_png(&item.image, &step_dir.join(&filename))?;
            debug!("  Debug: saved {}/{}", step_dir_name, filename);
        }

        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn debug_filename(run_id: usize, idx: usize, total: usize) -> String {
    if total <= 1 {
        format!("frame_{:04}.png", run_id)
    } else {
        format!("frame_{:04}_{:02}.png", run_id, idx + 1)
    }
}

fn save_png(image: &DynamicImage, path: &Path) -> Result<()> {
    image.save(path)
        .map_err(|e| anyhow::anyhow!("Failed to save debug image {}: {}", path.display(), e))
}
