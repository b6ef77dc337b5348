use nalgebra::{Matrix2, SymmetricEigen};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::InputError;
use crate::processing::contours::{closed_arc_length, signed_area, Point};

/// Size and shape descriptors of a lesion outline. Lengths in pixels unless
/// suffixed `_mm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphologyRecord {
    pub area_pixels: f64,
    pub area_mm2: f64,
    pub perimeter_pixels: f64,
    pub perimeter_mm: f64,
    /// `4π·area / perimeter²`, 1 for a circle.
    pub circularity: f64,
    pub aspect_ratio: f64,
    /// Area over convex hull area.
    pub solidity: f64,
    /// Perimeter over convex hull perimeter.
    pub irregularity: f64,
    pub equivalent_diameter_pixels: f64,
    pub equivalent_diameter_mm: f64,
    pub major_axis_mm: f64,
    pub minor_axis_mm: f64,
}

/// Below this many vertices the ellipse fit is skipped.
const MIN_ELLIPSE_POINTS: usize = 5;

pub fn measure(points: &[Point], pixel_spacing: f64) -> Result<MorphologyRecord, InputError> {
    if points.len() < 3 {
        return Err(InputError::TooFewPoints(points.len()));
    }

    let area = signed_area(points).abs();
    let perimeter = closed_arc_length(points);
    let hull = convex_hull(points);
    let hull_area = signed_area(&hull).abs();
    let hull_perimeter = closed_arc_length(&hull);

    let circularity = ratio(4.0 * PI * area, perimeter * perimeter);
    let solidity = ratio(area, hull_area);
    let irregularity = ratio(perimeter, hull_perimeter);
    let equivalent_diameter = (4.0 * area / PI).sqrt();

    let (major, minor) = if points.len() >= MIN_ELLIPSE_POINTS {
        ellipse_axes(points)
    } else {
        (0.0, 0.0)
    };
    let aspect_ratio = if minor > 0.0 { major / minor } else { 1.0 };

    Ok(MorphologyRecord {
        area_pixels: area,
        area_mm2: area * pixel_spacing * pixel_spacing,
        perimeter_pixels: perimeter,
        perimeter_mm: perimeter * pixel_spacing,
        circularity,
        aspect_ratio,
        solidity,
        irregularity,
        equivalent_diameter_pixels: equivalent_diameter,
        equivalent_diameter_mm: equivalent_diameter * pixel_spacing,
        major_axis_mm: major * pixel_spacing,
        minor_axis_mm: minor * pixel_spacing,
    })
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > f64::EPSILON {
        num / den
    } else {
        0.0
    }
}

fn cross(o: &Point, a: &Point, b: &Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Andrew's monotone chain. Counter-clockwise, collinear points dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted: Vec<Point> = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<Point> = Vec::with_capacity(2 * sorted.len());
    for p in sorted.iter() {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    let lower_len = hull.len() + 1;
    for p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}

/// Full major and minor axis of the ellipse sharing the polygon's second
/// area moments. For a filled ellipse each covariance eigenvalue is a
/// quarter of the squared semi-axis, so the full axis is `4·sqrt(λ)`.
fn ellipse_axes(points: &[Point]) -> (f64, f64) {
    let n = points.len();
    // shift to the vertex mean to keep the moment sums well conditioned
    let origin = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let origin = (origin.0 / n as f64, origin.1 / n as f64);

    let (mut a2, mut cx, mut cy, mut ixx, mut iyy, mut ixy) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for i in 0..n {
        let (x0, y0) = (points[i].x - origin.0, points[i].y - origin.1);
        let next = &points[(i + 1) % n];
        let (x1, y1) = (next.x - origin.0, next.y - origin.1);
        let c = x0 * y1 - x1 * y0;
        a2 += c;
        cx += (x0 + x1) * c;
        cy += (y0 + y1) * c;
        ixx += (x0 * x0 + x0 * x1 + x1 * x1) * c;
        iyy += (y0 * y0 + y0 * y1 + y1 * y1) * c;
        ixy += (x0 * y1 + 2.0 * x0 * y0 + 2.0 * x1 * y1 + x1 * y0) * c;
    }
    if a2.abs() <= f64::EPSILON {
        return (0.0, 0.0);
    }

    let area = a2 / 2.0;
    let (mx, my) = (cx / (6.0 * area), cy / (6.0 * area));
    let sxx = ixx / (12.0 * area) - mx * mx;
    let syy = iyy / (12.0 * area) - my * my;
    let sxy = ixy / (24.0 * area) - mx * my;

    let eigen = SymmetricEigen::new(Matrix2::new(sxx, sxy, sxy, syy));
    let (l1, l2) = (eigen.eigenvalues[0].max(0.0), eigen.eigenvalues[1].max(0.0));
    let (major, minor) = if l1 >= l2 { (l1, l2) } else { (l2, l1) };
    (4.0 * major.sqrt(), 4.0 * minor.sqrt())
}

#[cfg(test)]
mod morphology_tests {
    use super::*;
    use crate::utils::test_utils::{
        generate_circle_points, generate_ellipse_points, generate_star_points,
    };
    use approx::assert_relative_eq;

    #[test]
    fn test_circle_descriptors() {
        let points = generate_circle_points(50.0, 360, (200.0, 200.0));
        let m = measure(&points, 0.1).unwrap();

        assert_relative_eq!(m.equivalent_diameter_mm, 10.0, epsilon = 0.01);
        assert_relative_eq!(m.area_mm2, PI * 25.0, epsilon = 0.05);
        assert_relative_eq!(m.circularity, 1.0, epsilon = 1e-3);
        assert_relative_eq!(m.solidity, 1.0, epsilon = 1e-9);
        assert_relative_eq!(m.irregularity, 1.0, epsilon = 1e-9);
        assert_relative_eq!(m.major_axis_mm, 10.0, epsilon = 0.01);
        assert_relative_eq!(m.minor_axis_mm, 10.0, epsilon = 0.01);
        assert_relative_eq!(m.aspect_ratio, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_rotated_ellipse_axes() {
        let points = generate_ellipse_points(80.0, 40.0, 720, 0.6, (300.0, 250.0));
        let m = measure(&points, 0.1).unwrap();

        assert_relative_eq!(m.major_axis_mm, 16.0, epsilon = 0.02);
        assert_relative_eq!(m.minor_axis_mm, 8.0, epsilon = 0.02);
        assert_relative_eq!(m.aspect_ratio, 2.0, epsilon = 0.01);
        assert!(m.circularity < 0.95);
    }

    #[test]
    fn test_star_is_less_solid_and_more_irregular() {
        let points = generate_star_points(100.0, 30.0, 6, 720, (200.0, 200.0));
        let m = measure(&points, 0.1).unwrap();
        assert!(m.solidity < 0.98);
        assert!(m.irregularity > 1.02);
        assert!(m.circularity < 0.9);
    }

    #[test]
    fn test_square_skips_ellipse_fit() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let m = measure(&square, 1.0).unwrap();
        assert_relative_eq!(m.area_pixels, 100.0);
        assert_relative_eq!(m.perimeter_pixels, 40.0);
        assert_relative_eq!(m.circularity, PI / 4.0);
        assert_eq!(m.major_axis_mm, 0.0);
        assert_eq!(m.minor_axis_mm, 0.0);
        assert_eq!(m.aspect_ratio, 1.0);
    }

    #[test]
    fn test_degenerate_outlines() {
        assert_eq!(
            measure(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)], 0.1),
            Err(InputError::TooFewPoints(2))
        );

        let line: Vec<Point> = (0..6).map(|i| Point::new(i as f64, 0.0)).collect();
        let m = measure(&line, 0.1).unwrap();
        assert_eq!(m.area_pixels, 0.0);
        assert_eq!(m.circularity, 0.0);
        assert_eq!(m.solidity, 0.0);
        // the hull of a segment is the segment traced both ways
        assert_relative_eq!(m.irregularity, 1.0);
        assert_eq!(m.aspect_ratio, 1.0);

        let same = vec![Point::new(3.0, 3.0); 4];
        let m = measure(&same, 0.1).unwrap();
        assert_eq!(m.perimeter_pixels, 0.0);
        assert_eq!(m.circularity, 0.0);
    }

    #[test]
    fn test_hull_of_square_with_interior_point() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(2.0, 1.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&Point::new(2.0, 1.0)));
        assert_relative_eq!(signed_area(&hull), 16.0);
    }
}
