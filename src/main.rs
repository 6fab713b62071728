use clap::Parser;
use image::ImageReader;
use log::LevelFilter;
use std::path::PathBuf;

use treemeasure::{
    Calibration, MeasureConfig, MeasurementSession, PixelPoint, SessionEvent, SessionOutput,
    TrunkDetector,
};

#[derive(Parser)]
#[command(name = "treemeasure")]
#[command(about = "Estimate trunk diameter, height and lumber yield from camera frames")]
struct Cli {
    /// Frames to measure, in order
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// JSON file overriding pipeline parameters
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Known scale in centimeters per pixel
    #[arg(long, value_name = "CM", conflicts_with = "calibrate")]
    cm_per_pixel: Option<f64>,

    /// Two points spanning the reference object, as X1,Y1,X2,Y2
    #[arg(long, value_name = "X1,Y1,X2,Y2", requires = "ref_cm", value_parser = parse_points)]
    calibrate: Option<(PixelPoint, PixelPoint)>,

    /// Physical length of the reference object in centimeters
    #[arg(long, value_name = "CM")]
    ref_cm: Option<f64>,

    /// Save intermediate masks to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print each result as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_points(s: &str) -> Result<(PixelPoint, PixelPoint), String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{}': {}", v, e)))
        .collect::<Result<_, _>>()?;

    match values.as_slice() {
        [x1, y1, x2, y2] => Ok((PixelPoint::new(*x1, *y1), PixelPoint::new(*x2, *y2))),
        _ => Err(format!("expected 4 comma-separated numbers, got {}", values.len())),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let config = match &args.config {
        Some(path) => MeasureConfig::from_json_file(path)?,
        None => MeasureConfig::default(),
    };

    let mut detector = TrunkDetector::new(config)?;
    if let Some(debug_dir) = args.debug_out.clone() {
        detector = detector.with_debug(debug_dir)?;
    }

    let mut session = MeasurementSession::new(detector);
    if let Some(cm) = args.cm_per_pixel {
        session = session.with_calibration(Calibration::from_cm_per_pixel(cm)?);
    }
    if let Some(((first, second), reference_cm)) = args.calibrate.zip(args.ref_cm) {
        session = session.with_reference(first, second, reference_cm)?;
        println!("Calibration complete: 1 pixel = {:.4} cm", session.calibration_status().cm_per_pixel);
    }

    for path in &args.images {
        let img = ImageReader::open(path)?
            .decode()
            .map_err(|e| anyhow::anyhow!("Failed to decode image {}: {}", path.display(), e))?;
        log::debug!("Loaded {}: {}x{}", path.display(), img.width(), img.height());

        report(path, session.handle(SessionEvent::Frame(img)), args.json)?;
    }

    let status = session.calibration_status();
    if !status.calibrated {
        log::warn!(
            "Not calibrated: figures use the placeholder scale of {} cm/pixel and are not physical",
            status.cm_per_pixel
        );
    }

    Ok(())
}

fn report(path: &std::path::Path, output: Option<SessionOutput>, json: bool) -> anyhow::Result<()> {
    let Some(SessionOutput::Detection(detection)) = output else {
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string(&detection)?);
    } else {
        println!("\n=== {} ===", path.display());
        println!("{}", detection);
    }

    Ok(())
}
