mod common;

use approx::assert_relative_eq;
use common::*;
use image::{DynamicImage, Rgb};
use std::f64::consts::PI;
use std::sync::Arc;
use treemeasure::detection::measure_frame;
use treemeasure::detection::measurement::VolumeModel;
use treemeasure::detection::steps::MeasurementStep;
use treemeasure::{KernelShape, Pipeline};

#[test]
fn all_background_frame_is_no_detection() {
    let detector = default_detector();
    let frame = DynamicImage::ImageRgb8(blank_frame(SKY));
    assert_eq!(detector.run_pipeline(frame, &Calibration::default()), Detection::NoDetection);
}

#[test]
fn brown_rectangle_is_measured_as_a_cylinder() {
    let detector = default_detector();
    let frame = trunk_frame(100, 100, 200, 100);

    let detection = detector.run_pipeline(frame, &Calibration::uncalibrated(0.1));
    let m = detection.measurement().expect("trunk should be detected");

    assert_eq!((m.bbox.x, m.bbox.y, m.bbox.width, m.bbox.height), (100, 100, 200, 100));
    assert_relative_eq!(m.diameter_cm, 20.0, epsilon = 1e-9);
    assert_relative_eq!(m.height_cm, 10.0, epsilon = 1e-9);
    assert_relative_eq!(m.volume_cm3, PI * 100.0 * 10.0, epsilon = 1e-6);
    assert_relative_eq!(m.lumber_count, 1.5708, epsilon = 1e-4);
    assert_relative_eq!(m.weight_kg.unwrap(), m.volume_cm3 * 0.6 / 1000.0, epsilon = 1e-12);
    assert!(m.contour_area_px >= 1000.0);
    assert!(!m.calibrated);
}

#[test]
fn rgba_frames_measure_like_rgb() {
    let detector = default_detector();
    let calibration = Calibration::default();
    let rgb = detector.run_pipeline(trunk_frame(50, 60, 120, 300), &calibration);
    let rgba = detector.run_pipeline(trunk_frame_rgba(50, 60, 120, 300), &calibration);
    assert!(rgb.is_detected());
    assert_eq!(rgb, rgba);
}

#[test]
fn repeated_runs_are_identical() {
    let detector = default_detector();
    let frame = Arc::new(trunk_frame(200, 40, 80, 400));
    let calibration = Calibration::from_cm_per_pixel(0.25).unwrap();

    let first = detector.run_pipeline(Arc::clone(&frame), &calibration);
    let second = detector.run_pipeline(frame, &calibration);
    assert!(first.is_detected());
    assert_eq!(first, second);
}

#[test]
fn empty_frame_is_no_detection() {
    let detector = default_detector();
    let frame = DynamicImage::new_rgb8(0, 0);
    assert_eq!(detector.run_pipeline(frame, &Calibration::default()), Detection::NoDetection);
}

#[test]
fn speckle_noise_alone_is_no_detection() {
    let detector = default_detector();
    let mut frame = blank_frame(SKY);
    for y in (0..480).step_by(10) {
        for x in (0..640).step_by(10) {
            frame.put_pixel(x, y, BARK);
        }
    }
    let detection = detector.run_pipeline(DynamicImage::ImageRgb8(frame), &Calibration::default());
    assert_eq!(detection, Detection::NoDetection);
}

#[test]
fn blob_below_minimum_area_is_ignored() {
    let detector = default_detector();
    let frame = trunk_frame(300, 200, 20, 20);
    assert_eq!(detector.run_pipeline(frame, &Calibration::default()), Detection::NoDetection);
}

#[test]
fn minimum_area_is_configurable() {
    let config = MeasureConfig { min_contour_area: 100.0, ..MeasureConfig::default() };
    let detector = TrunkDetector::new(config).unwrap();
    let frame = trunk_frame(300, 200, 20, 20);
    assert!(detector.run_pipeline(frame, &Calibration::default()).is_detected());
}

#[test]
fn largest_of_several_blobs_is_the_trunk() {
    let detector = default_detector();
    let mut frame = blank_frame(GRASS);
    paint_rect(&mut frame, 20, 20, 60, 60, BARK);
    paint_rect(&mut frame, 300, 100, 150, 200, BARK);
    paint_rect(&mut frame, 520, 300, 80, 80, BARK);

    let detection = detector.run_pipeline(DynamicImage::ImageRgb8(frame), &Calibration::default());
    let m = detection.measurement().unwrap();
    assert_eq!((m.bbox.x, m.bbox.width, m.bbox.height), (300, 150, 200));
}

#[test]
fn holes_inside_the_trunk_do_not_change_its_outline() {
    let detector = default_detector();
    let mut frame = blank_frame(SKY);
    paint_rect(&mut frame, 100, 50, 200, 300, BARK);
    paint_rect(&mut frame, 150, 150, 50, 50, SKY);

    let detection = detector.run_pipeline(DynamicImage::ImageRgb8(frame), &Calibration::default());
    let m = detection.measurement().unwrap();
    assert_eq!((m.bbox.width, m.bbox.height), (200, 300));
}

#[test]
fn reddish_bark_is_caught_by_the_wrapped_hue_band() {
    let detector = default_detector();
    let mut frame = blank_frame(SKY);
    paint_rect(&mut frame, 100, 100, 100, 200, Rgb([120, 40, 60]));
    let detection = detector.run_pipeline(DynamicImage::ImageRgb8(frame), &Calibration::default());
    assert!(detection.is_detected());
}

#[test]
fn small_gaps_between_fragments_are_bridged() {
    let config = MeasureConfig { kernel_shape: KernelShape::Rectangle, ..MeasureConfig::default() };
    let detector = TrunkDetector::new(config).unwrap();
    let mut frame = blank_frame(SKY);
    paint_rect(&mut frame, 200, 50, 100, 150, BARK);
    // 4 px crack across the trunk
    paint_rect(&mut frame, 200, 204, 100, 150, BARK);

    let detection = detector.run_pipeline(DynamicImage::ImageRgb8(frame), &Calibration::default());
    let m = detection.measurement().unwrap();
    assert_eq!(m.bbox.height, 304);
}

#[test]
fn weight_is_omitted_without_density() {
    let config = MeasureConfig { wood_density_g_per_cm3: None, ..MeasureConfig::default() };
    let detector = TrunkDetector::new(config).unwrap();
    let detection = detector.run_pipeline(trunk_frame(100, 100, 200, 100), &Calibration::default());
    assert!(detection.measurement().unwrap().weight_kg.is_none());
}

#[test]
fn calibrated_scale_maps_reference_span_back_to_reference_length() {
    let calibration =
        Calibration::from_reference(PixelPoint::new(10.0, 10.0), PixelPoint::new(130.0, 10.0), 30.0)
            .unwrap();
    let detector = default_detector();
    let detection = detector.run_pipeline(trunk_frame(100, 100, 120, 240), &calibration);
    let m = detection.measurement().unwrap();
    assert_relative_eq!(m.diameter_cm, 30.0, epsilon = 1e-9);
    assert_relative_eq!(m.height_cm, 60.0, epsilon = 1e-9);
    assert!(m.calibrated);
}

#[test]
fn debug_mode_saves_each_stage() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let detector = default_detector().with_debug(dir.path().to_path_buf())?;

    let detection = detector.run_pipeline(trunk_frame(100, 100, 200, 100), &Calibration::default());
    assert!(detection.is_detected());

    for step in ["00_input", "01_color_segmentation", "02_mask_refinement", "03_contour_selection", "04_measurement"] {
        assert!(dir.path().join(step).join("frame_0001.png").exists(), "missing {}", step);
    }
    Ok(())
}

fn measurement_only_pipeline() -> Pipeline {
    Pipeline::new().add_step_boxed(Box::new(MeasurementStep {
        model: VolumeModel { lumber_piece_volume_cm3: 2000.0, wood_density_g_per_cm3: None },
    }))
}

#[test]
fn measurement_without_selected_contour_is_an_error() {
    let pipeline = measurement_only_pipeline();
    assert!(pipeline.run(Arc::new(trunk_frame(0, 0, 10, 10)), &Calibration::default()).is_err());
}

#[test]
fn failing_pipeline_reports_no_detection() {
    let pipeline = measurement_only_pipeline();
    let detection = measure_frame(&pipeline, Arc::new(trunk_frame(100, 100, 200, 100)), &Calibration::default());
    assert_eq!(detection, Detection::NoDetection);
}
