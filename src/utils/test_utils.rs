use crate::processing::contours::{
    compute_curvature, compute_normals, CircularSeq, Point, RegularContour,
};
use crate::processing::raster::GrayRaster;
use std::f64::consts::PI;

/// Counter-clockwise circle starting at angle 0 (in image coordinates, where
/// y grows downwards, the angle runs clockwise on screen).
pub fn generate_circle_points(radius: f64, num_points: usize, center: (f64, f64)) -> Vec<Point> {
    generate_ellipse_points(radius, radius, num_points, 0.0, center)
}

/// Generates ellipse contour points for testing
pub fn generate_ellipse_points(
    major: f64,
    minor: f64,
    num_points: usize,
    rotation: f64,
    translation: (f64, f64),
) -> Vec<Point> {
    (0..num_points)
        .map(|i| {
            let theta = 2.0 * PI * (i as f64) / (num_points as f64);
            let (x, y) = rotate_point((major * theta.cos(), minor * theta.sin()), rotation);
            Point::new(x + translation.0, y + translation.1)
        })
        .collect()
}

/// Star-shaped polygon `r(θ) = base + amplitude·cos(lobes·θ)`.
pub fn generate_star_points(
    base: f64,
    amplitude: f64,
    lobes: usize,
    num_points: usize,
    center: (f64, f64),
) -> Vec<Point> {
    (0..num_points)
        .map(|i| {
            let theta = 2.0 * PI * (i as f64) / (num_points as f64);
            let r = base + amplitude * (lobes as f64 * theta).cos();
            Point::new(center.0 + r * theta.cos(), center.1 + r * theta.sin())
        })
        .collect()
}

/// Rotates a point around origin
pub fn rotate_point(point: (f64, f64), angle: f64) -> (f64, f64) {
    let (x, y) = point;
    let cos = angle.cos();
    let sin = angle.sin();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Exact circle as a regular contour; point `i` sits at `i·360/n` degrees.
pub fn circle_contour(radius: f64, center: (f64, f64), num_points: usize) -> RegularContour {
    let points = CircularSeq::new(generate_circle_points(radius, num_points, center));
    let normals = compute_normals(&points).expect("circle has no degenerate tangents");
    let curvature = compute_curvature(&points);
    RegularContour {
        points,
        normals,
        curvature,
    }
}

/// Synthetic gradient-magnitude ring.
#[derive(Debug, Clone)]
pub struct SyntheticRing {
    /// Pixels whose center lies within this distance of the radius are on the ring.
    pub half_width: f64,
    pub ring_value: f64,
    pub background: f64,
    /// Angular interval `[from, to)` in degrees where the ring is missing.
    pub gap_degrees: Option<(f64, f64)>,
}

impl Default for SyntheticRing {
    fn default() -> Self {
        Self {
            half_width: 1.5,
            ring_value: 1.0,
            background: 0.05,
            gap_degrees: None,
        }
    }
}

fn pixel_polar(x: u32, y: u32, center: (f64, f64)) -> (f64, f64) {
    let dx = x as f64 + 0.5 - center.0;
    let dy = y as f64 + 0.5 - center.1;
    let degrees = dy.atan2(dx).to_degrees().rem_euclid(360.0);
    ((dx * dx + dy * dy).sqrt(), degrees)
}

pub fn gradient_ring_raster(
    width: u32,
    height: u32,
    center: (f64, f64),
    radius: f64,
    ring: &SyntheticRing,
) -> GrayRaster {
    GrayRaster::from_fn(width, height, |x, y| {
        let (distance, degrees) = pixel_polar(x, y, center);
        let in_gap = ring
            .gap_degrees
            .is_some_and(|(from, to)| degrees >= from && degrees < to);
        if (distance - radius).abs() <= ring.half_width && !in_gap {
            ring.ring_value
        } else {
            ring.background
        }
    })
}

/// Intensity given by `inside(θ)` within `radius` and `outside(θ)` beyond it,
/// θ in radians.
pub fn angular_pattern_raster<F, G>(
    width: u32,
    height: u32,
    center: (f64, f64),
    radius: f64,
    inside: F,
    outside: G,
) -> GrayRaster
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    GrayRaster::from_fn(width, height, |x, y| {
        let (distance, degrees) = pixel_polar(x, y, center);
        let theta = degrees.to_radians();
        if distance < radius {
            inside(theta)
        } else {
            outside(theta)
        }
    })
}
