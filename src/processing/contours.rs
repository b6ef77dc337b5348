use nalgebra::{Point2, Vector2};

use crate::error::InputError;

pub type Point = Point2<f64>;

/// Default fraction of the densified vertex count used as smoothing window.
pub const DEFAULT_SMOOTHING_RATIO: f64 = 0.01;

/// Spacing (pixels) at which long annotation edges are subdivided before smoothing.
const DENSIFY_SPACING: f64 = 1.0;

const MIN_SMOOTHING_WINDOW: usize = 3;

/// Longest annotation edge (pixels) accepted before densification.
pub const MAX_EDGE_LENGTH: f64 = 100_000.0;

/// Fixed-length sequence whose index wraps around: `at(-1)` is the last
/// element, `at(len)` the first.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularSeq<T> {
    items: Vec<T>,
}

impl<T> CircularSeq<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Wrapped position of `i`. Panics on an empty sequence.
    pub fn wrap(&self, i: isize) -> usize {
        i.rem_euclid(self.items.len() as isize) as usize
    }

    /// Element at `i mod len`. Panics on an empty sequence.
    pub fn at(&self, i: isize) -> &T {
        &self.items[self.wrap(i)]
    }

    /// Previous and next element around index `i`.
    pub fn neighbours(&self, i: usize) -> (&T, &T) {
        let i = i as isize;
        (self.at(i - 1), self.at(i + 1))
    }

    /// Elements in the centered window `[i - half, i + half]`, wrapping.
    pub fn window(&self, i: usize, half: usize) -> impl Iterator<Item = &T> + '_ {
        let (i, half) = (i as isize, half as isize);
        (i - half..=i + half).map(move |k| self.at(k))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> From<Vec<T>> for CircularSeq<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

/// Uniformly resampled closed boundary with its index-aligned outward normals
/// and signed curvature.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularContour {
    pub points: CircularSeq<Point>,
    pub normals: CircularSeq<Vector2<f64>>,
    pub curvature: CircularSeq<f64>,
}

impl RegularContour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn centroid(&self) -> Point {
        centroid(self.points.as_slice())
    }
}

/// Smooths and resamples a raw annotation polygon to `target_count` points.
pub fn regularize(raw: &[Point], target_count: usize) -> Result<RegularContour, InputError> {
    regularize_with(raw, target_count, DEFAULT_SMOOTHING_RATIO)
}

pub fn regularize_with(
    raw: &[Point],
    target_count: usize,
    smoothing_ratio: f64,
) -> Result<RegularContour, InputError> {
    if target_count < 3 {
        return Err(InputError::InvalidConfig(format!(
            "target point count must be at least 3, got {}",
            target_count
        )));
    }
    let smoothed = smooth_polygon(raw, smoothing_ratio)?;
    let points = resample(&smoothed, target_count)?;
    let normals = compute_normals(&points)?;
    let curvature = compute_curvature(&points);

    log::debug!(
        "Regularized {} raw points into {} points (arc length {:.1}px)",
        raw.len(),
        points.len(),
        closed_arc_length(points.as_slice())
    );

    Ok(RegularContour {
        points,
        normals,
        curvature,
    })
}

/// Closes, densifies and smooths a raw polygon. The returned vertices are an
/// implicit ring (the closing edge is not repeated).
pub fn smooth_polygon(raw: &[Point], smoothing_ratio: f64) -> Result<Vec<Point>, InputError> {
    if raw.is_empty() {
        return Err(InputError::EmptyInput);
    }
    check_finite(raw)?;
    let closed = close_polygon(raw);
    check_edge_lengths(&closed)?;
    let ring = densify(&closed, DENSIFY_SPACING);
    check_polygon_extent(&ring)?;

    let window = smoothing_window(ring.len(), smoothing_ratio);
    if window >= ring.len() {
        log::debug!(
            "Polygon with {} vertices too small for smoothing window {}",
            ring.len(),
            window
        );
        return Ok(ring);
    }
    let smoothed = smooth_closed(&ring, window);
    check_polygon_extent(&smoothed)?;
    Ok(smoothed)
}

/// Returns the polygon with its first point repeated at the end, unless it
/// already is closed.
pub fn close_polygon(points: &[Point]) -> Vec<Point> {
    let mut closed = points.to_vec();
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        if points.len() == 1 || (*first - *last).norm() > f64::EPSILON {
            closed.push(*first);
        }
    }
    closed
}

/// Subdivides edges of an explicitly closed polygon so no edge is longer than
/// `spacing`. Output is an implicit ring.
fn densify(closed: &[Point], spacing: f64) -> Vec<Point> {
    let mut ring = Vec::with_capacity(closed.len());
    for pair in closed.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let steps = ((b - a).norm() / spacing).ceil().max(1.0) as usize;
        for k in 0..steps {
            let t = k as f64 / steps as f64;
            ring.push(a + (b - a) * t);
        }
    }
    ring
}

/// Odd moving-average window derived from the vertex count, at least 3.
pub fn smoothing_window(vertex_count: usize, smoothing_ratio: f64) -> usize {
    let raw = (vertex_count as f64 * smoothing_ratio).round().max(0.0) as usize;
    raw.max(MIN_SMOOTHING_WINDOW) | 1
}

/// Circular moving average over the vertices of an implicit ring.
pub fn smooth_closed(ring: &[Point], window: usize) -> Vec<Point> {
    let n = ring.len() as isize;
    let half = (window / 2) as isize;
    let width = (2 * half + 1) as f64;
    (0..n)
        .map(|i| {
            let sum = (i - half..=i + half)
                .map(|k| ring[k.rem_euclid(n) as usize].coords)
                .fold(Vector2::zeros(), |acc, v| acc + v);
            Point::from(sum / width)
        })
        .collect()
}

/// Resamples an implicit ring at `target_count` equally spaced arc-length
/// positions, starting at the first vertex.
pub fn resample(ring: &[Point], target_count: usize) -> Result<CircularSeq<Point>, InputError> {
    if ring.is_empty() {
        return Err(InputError::EmptyInput);
    }
    check_finite(ring)?;
    let closed = close_polygon(ring);
    let cumulative = cumulative_arc_length(&closed);
    let total = cumulative.last().copied().unwrap_or(0.0);
    if total <= f64::EPSILON || target_count == 0 {
        return Err(InputError::DegenerateContour(
            "polygon has zero perimeter".to_string(),
        ));
    }

    let last_segment = closed.len() - 2;
    let points = (0..target_count)
        .map(|k| {
            let target = total * k as f64 / target_count as f64;
            let idx = cumulative
                .partition_point(|&c| c < target)
                .saturating_sub(1)
                .min(last_segment);
            let seg_len = cumulative[idx + 1] - cumulative[idx];
            let t = if seg_len > 0.0 {
                (target - cumulative[idx]) / seg_len
            } else {
                0.0
            };
            closed[idx] + (closed[idx + 1] - closed[idx]) * t
        })
        .collect();

    Ok(CircularSeq::new(points))
}

fn cumulative_arc_length(closed: &[Point]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(closed.len());
    let mut acc = 0.0;
    cumulative.push(acc);
    for pair in closed.windows(2) {
        acc += (pair[1] - pair[0]).norm();
        cumulative.push(acc);
    }
    cumulative
}

/// Perimeter of an implicit ring, including the closing edge.
pub fn closed_arc_length(ring: &[Point]) -> f64 {
    let n = ring.len();
    (0..n).map(|i| (ring[(i + 1) % n] - ring[i]).norm()).sum()
}

/// Shoelace signed area of an implicit ring; positive for counter-clockwise
/// order in a y-up frame.
pub fn signed_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let (p, q) = (ring[i], ring[(i + 1) % n]);
            p.x * q.y - q.x * p.y
        })
        .sum();
    0.5 * twice
}

pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::origin();
    }
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc: Vector2<f64>, p| acc + p.coords);
    Point::from(sum / points.len() as f64)
}

fn check_finite(points: &[Point]) -> Result<(), InputError> {
    match points
        .iter()
        .position(|p| !p.x.is_finite() || !p.y.is_finite())
    {
        Some(i) => Err(InputError::DegenerateContour(format!(
            "non-finite coordinate at index {}",
            i
        ))),
        None => Ok(()),
    }
}

fn check_edge_lengths(closed: &[Point]) -> Result<(), InputError> {
    for (i, pair) in closed.windows(2).enumerate() {
        let length = (pair[1] - pair[0]).norm();
        if length > MAX_EDGE_LENGTH {
            return Err(InputError::DegenerateContour(format!(
                "edge {} is {:.0}px long, limit is {:.0}px",
                i, length, MAX_EDGE_LENGTH
            )));
        }
    }
    Ok(())
}

fn check_polygon_extent(ring: &[Point]) -> Result<(), InputError> {
    let perimeter = closed_arc_length(ring);
    if perimeter <= f64::EPSILON {
        return Err(InputError::DegenerateContour(
            "polygon has zero perimeter".to_string(),
        ));
    }
    if signed_area(ring).abs() <= 1e-9 * perimeter * perimeter {
        return Err(InputError::DegenerateContour(
            "polygon encloses no area".to_string(),
        ));
    }
    Ok(())
}

/// Unit normals pointing away from the centroid, from central-difference
/// tangents rotated by +90°.
pub fn compute_normals(points: &CircularSeq<Point>) -> Result<CircularSeq<Vector2<f64>>, InputError> {
    if points.is_empty() {
        return Err(InputError::EmptyContour);
    }
    let center = centroid(points.as_slice());

    let mut normals = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        let (prev, next) = points.neighbours(i);
        let tangent = *next - *prev;
        let length = tangent.norm();
        if length <= f64::EPSILON {
            return Err(InputError::DegenerateContour(format!(
                "zero-length tangent at index {}",
                i
            )));
        }
        let mut normal = Vector2::new(-tangent.y, tangent.x) / length;
        if normal.dot(&(center - *p)) > 0.0 {
            normal = -normal;
        }
        normals.push(normal);
    }
    Ok(CircularSeq::new(normals))
}

/// Three-point signed curvature. Positive where the boundary bulges outward,
/// regardless of whether the contour runs clockwise or counter-clockwise.
pub fn compute_curvature(points: &CircularSeq<Point>) -> CircularSeq<f64> {
    if points.is_empty() {
        return CircularSeq::new(Vec::new());
    }
    let orientation = if signed_area(points.as_slice()) < 0.0 {
        -1.0
    } else {
        1.0
    };

    let curvature = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let (prev, next) = points.neighbours(i);
            let v1 = *p - *prev;
            let v2 = *next - *p;
            let (len1, len2) = (v1.norm(), v2.norm());
            if len1 > 0.0 && len2 > 0.0 {
                let cross = v1.x * v2.y - v1.y * v2.x;
                orientation * 2.0 * cross / (len1 * len2 * (len1 + len2))
            } else {
                0.0
            }
        })
        .collect();
    CircularSeq::new(curvature)
}
