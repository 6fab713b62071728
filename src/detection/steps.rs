use crate::pipeline::{PipelineData, PipelineStep, PipelineContext, MetadataValue};
use crate::detection::{segmentation, morphology, contours, measurement};
use crate::config::{HsvRange, KernelShape};
use anyhow::Result;
use image::DynamicImage;
use log::debug;

/// Threshold the frame in HSV space into a wood-color mask
pub struct ColorSegmentationStep {
    pub ranges: Vec<HsvRange>,
}

impl PipelineStep for ColorSegmentationStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let rgb = item.original.to_rgb8();
            let mask = segmentation::segment_wood(&rgb, &self.ranges);
            let foreground = segmentation::foreground_pixels(&mask);
            debug!("  {} of {} pixels wood colored", foreground, rgb.width() as u64 * rgb.height() as u64);

            let new_item = item
                .with_image(DynamicImage::ImageLuma8(mask))
                .with_metadata("foreground_pixels", MetadataValue::Int(foreground as i64));
            result.push(new_item);
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Color Segmentation"
    }
}

/// Morphological open then close on the mask
pub struct MaskRefinementStep {
    pub open_kernel: u32,
    pub close_kernel: u32,
    pub shape: KernelShape,
}

impl PipelineStep for MaskRefinementStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let mask = item.image.to_luma8();
            let refined = morphology::refine_mask(&mask, self.open_kernel, self.close_kernel, self.shape);
            let foreground = segmentation::foreground_pixels(&refined);

            let new_item = item
                .with_image(DynamicImage::ImageLuma8(refined))
                .with_metadata("refined_foreground_pixels", MetadataValue::Int(foreground as i64));
            result.push(new_item);
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Mask Refinement"
    }
}

/// Keep the single largest external contour above the area threshold.
/// Items with no qualifying contour are dropped.
pub struct ContourSelectionStep {
    pub min_area: f64,
}

impl PipelineStep for ContourSelectionStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let mask = item.image.to_luma8();
            let found = contours::find_external_contours(&mask);
            let count = found.len();

            let Some((contour, area)) = contours::select_trunk(found, self.min_area) else {
                debug!("  none of {} contours reached {} px²", count, self.min_area);
                continue;
            };
            debug!("  selected contour of {:.0} px² from {} candidates", area, count);

            let mut new_item = item
                .with_metadata("contour_count", MetadataValue::Int(count as i64))
                .with_metadata("contour_area", MetadataValue::Float(area));
            new_item.contour = Some(contour);
            result.push(new_item);
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Contour Selection"
    }
}

/// Turn the selected contour's bounding box into centimeters, volume and lumber
pub struct MeasurementStep {
    pub model: measurement::VolumeModel,
}

impl PipelineStep for MeasurementStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let contour = item.contour.as_ref()
                .ok_or_else(|| anyhow::anyhow!("Missing selected contour"))?;
            let bbox = contour.bounding_box()
                .ok_or_else(|| anyhow::anyhow!("Selected contour has no points"))?;
            let area = item.get_float("contour_area").unwrap_or_else(|| contour.area());

            let measured = measurement::measure_trunk(bbox, area, &context.calibration, &self.model);

            let mut new_item = item;
            new_item.measurement = Some(measured);
            result.push(new_item);
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Measurement"
    }
}
