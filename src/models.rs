use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned bounding box in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Outer boundary of one connected mask region
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    /// Polygon area enclosed by the boundary points (shoelace formula)
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }

        let twice_area: i64 = (0..n)
            .map(|i| {
                let p = self.points[i];
                let q = self.points[(i + 1) % n];
                p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64
            })
            .sum();

        (twice_area as f64 / 2.0).abs()
    }

    /// Smallest box containing every boundary pixel, inclusive of both ends
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(BoundingBox {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }
}

/// A 2D coordinate in frame pixel space, e.g. a calibration click
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &PixelPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Physical estimate derived from one trunk detection.
///
/// Volume treats the trunk as a right circular cylinder whose diameter is the
/// bounding-box width, so leaning or oval trunks read high.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub diameter_cm: f64,
    pub height_cm: f64,
    pub volume_cm3: f64,
    pub weight_kg: Option<f64>,
    pub lumber_count: f64,
    pub bbox: BoundingBox,
    pub contour_area_px: f64,
    /// False while the placeholder scale is in use; the figures are then
    /// proportional only.
    pub calibrated: bool,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Detection {
    Measured(Measurement),
    NoDetection,
}

impl Detection {
    pub fn measurement(&self) -> Option<&Measurement> {
        match self {
            Detection::Measured(m) => Some(m),
            Detection::NoDetection => None,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Detection::Measured(_))
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detection::Measured(m) => {
                writeln!(f, "Diameter: {:.1} cm", m.diameter_cm)?;
                writeln!(f, "Height: {:.1} cm", m.height_cm)?;
                writeln!(f, "Volume: {:.1} cm³", m.volume_cm3)?;
                if let Some(weight) = m.weight_kg {
                    writeln!(f, "Weight: {:.1} kg", weight)?;
                }
                write!(f, "Lumber Estimate: {:.1} pieces", m.lumber_count)
            }
            Detection::NoDetection => {
                writeln!(f, "Diameter: No tree detected")?;
                writeln!(f, "Height: -- cm")?;
                write!(f, "Lumber Estimate: -- pieces")
            }
        }
    }
}
