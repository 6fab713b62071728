use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

use crate::models::Contour;

/// Outer boundaries of top-level foreground regions.
/// Hole borders and regions nested inside holes are skipped.
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    if mask.width() == 0 || mask.height() == 0 {
        return Vec::new();
    }

    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| Contour::new(c.points))
        .collect()
}

/// Pick the contour with strictly greatest area among those at or above
/// `min_area`; the first one wins a tie.
///
/// Assumes the trunk is the dominant wood-colored blob. A second trunk or a
/// similarly colored background object of larger size will be chosen instead.
pub fn select_trunk(contours: Vec<Contour>, min_area: f64) -> Option<(Contour, f64)> {
    let mut best: Option<(Contour, f64)> = None;

    for contour in contours {
        let area = contour.area();
        if area < min_area {
            continue;
        }
        match &best {
            Some((_, best_area)) if area <= *best_area => {}
            _ => best = Some((contour, area)),
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::point::Point;

    fn square(x0: i32, y0: i32, side: i32) -> Contour {
        Contour::new(vec![
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ])
    }

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32, value: u8) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([value]));
            }
        }
    }

    #[test]
    fn largest_contour_wins() {
        let picked = select_trunk(vec![square(0, 0, 40), square(100, 100, 60), square(0, 100, 50)], 100.0);
        let (contour, area) = picked.unwrap();
        assert_eq!(area, 3600.0);
        assert_eq!(contour.points[0], Point::new(100, 100));
    }

    #[test]
    fn tie_keeps_first_encountered() {
        let (contour, _) = select_trunk(vec![square(0, 0, 30), square(50, 50, 30)], 10.0).unwrap();
        assert_eq!(contour.points[0], Point::new(0, 0));
    }

    #[test]
    fn everything_below_threshold_is_none() {
        assert!(select_trunk(vec![square(0, 0, 10), square(20, 20, 20)], 1000.0).is_none());
        assert!(select_trunk(Vec::new(), 0.0).is_none());
    }

    #[test]
    fn area_equal_to_threshold_is_kept() {
        // 30x30 polygon, area exactly 900
        let (_, area) = select_trunk(vec![square(0, 0, 30)], 900.0).unwrap();
        assert_eq!(area, 900.0);
        assert!(select_trunk(vec![square(0, 0, 30)], 900.5).is_none());
    }

    #[test]
    fn holes_do_not_produce_contours() {
        let mut mask = GrayImage::new(50, 50);
        fill(&mut mask, 5, 5, 40, 40, 255);
        fill(&mut mask, 15, 15, 20, 20, 0);
        // island inside the hole
        fill(&mut mask, 22, 22, 5, 5, 255);

        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let bbox = contours[0].bounding_box().unwrap();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (5, 5, 40, 40));
    }

    #[test]
    fn separate_regions_each_get_a_contour() {
        let mut mask = GrayImage::new(60, 20);
        fill(&mut mask, 2, 2, 10, 10, 255);
        fill(&mut mask, 30, 2, 20, 15, 255);
        assert_eq!(find_external_contours(&mask).len(), 2);
    }
}
