use nalgebra::Vector2;

use crate::processing::contours::Point;
use crate::processing::raster::GrayRaster;

/// One reading along a normal. `value` is `None` when the offset falls
/// outside the raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialSample {
    pub offset: i32,
    pub value: Option<f64>,
}

/// Readings at every integer offset along a direction, inward offsets
/// negative, outward positive.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialProfile {
    pub samples: Vec<RadialSample>,
}

impl RadialProfile {
    /// In-bounds samples as `(offset, value)`.
    pub fn valid(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.samples
            .iter()
            .filter_map(|s| s.value.map(|v| (s.offset, v)))
    }

    pub fn valid_count(&self) -> usize {
        self.valid().count()
    }

    /// Largest in-bounds value and the first offset it occurs at.
    pub fn max(&self) -> Option<(i32, f64)> {
        self.valid().fold(None, |best, (offset, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((offset, v)),
        })
    }

    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .valid()
            .fold((0.0, 0usize), |(s, c), (_, v)| (s + v, c + 1));
        (count > 0).then(|| sum / count as f64)
    }
}

/// Pixel holding a continuous coordinate.
pub fn pixel_of(x: f64, y: f64) -> (i64, i64) {
    (x.floor() as i64, y.floor() as i64)
}

/// Samples `raster` at each integer offset in `[-inner, outer]` along
/// `direction` from `point`.
pub fn sample(
    raster: &GrayRaster,
    point: &Point,
    direction: &Vector2<f64>,
    inner: usize,
    outer: usize,
) -> RadialProfile {
    let samples = (-(inner as i32)..=outer as i32)
        .map(|offset| {
            let pos = *point + *direction * offset as f64;
            let (x, y) = pixel_of(pos.x, pos.y);
            RadialSample {
                offset,
                value: raster.get(x, y),
            }
        })
        .collect();
    RadialProfile { samples }
}

/// Mean over the in-bounds part of a `window`-sized square centered on
/// `(x, y)`. `None` when the whole window lies outside the raster.
pub fn sample_windowed(raster: &GrayRaster, x: i64, y: i64, window: usize) -> Option<f64> {
    let half = (window / 2) as i64;
    let mut sum = 0.0;
    let mut count = 0usize;
    for wy in y - half..=y + half {
        for wx in x - half..=x + half {
            if let Some(v) = raster.get(wx, wy) {
                sum += v;
                count += 1;
            }
        }
    }
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod sampling_tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_covers_full_offset_range() {
        let raster = GrayRaster::from_fn(20, 20, |x, _| x as f64);
        let profile = sample(
            &raster,
            &Point::new(10.5, 10.5),
            &Vector2::new(1.0, 0.0),
            3,
            4,
        );
        let offsets: Vec<i32> = profile.samples.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![-3, -2, -1, 0, 1, 2, 3, 4]);
        assert_eq!(profile.samples[0].value, Some(7.0));
        assert_eq!(profile.max(), Some((4, 14.0)));
    }

    #[test]
    fn test_out_of_bounds_samples_never_reach_statistics() {
        // in-bounds values are 1, 2, 3 at x = 0, 1, 2; everything left of x=0 is outside
        let raster = GrayRaster::from_fn(3, 1, |x, _| (x + 1) as f64);
        let profile = sample(
            &raster,
            &Point::new(0.5, 0.5),
            &Vector2::new(1.0, 0.0),
            5,
            2,
        );
        assert_eq!(profile.samples.len(), 8);
        assert_eq!(profile.valid_count(), 3);
        assert!(profile.samples[..5].iter().all(|s| s.value.is_none()));
        assert_eq!(profile.max(), Some((2, 3.0)));
        assert_relative_eq!(profile.mean().unwrap(), 2.0);
    }

    #[test]
    fn test_fully_outside_profile_has_no_statistics() {
        let raster = GrayRaster::filled(4, 4, 9.0);
        let profile = sample(
            &raster,
            &Point::new(-20.0, -20.0),
            &Vector2::new(0.0, 1.0),
            2,
            2,
        );
        assert_eq!(profile.max(), None);
        assert_eq!(profile.mean(), None);
    }

    #[test]
    fn test_max_keeps_first_offset_on_ties() {
        let profile = RadialProfile {
            samples: vec![
                RadialSample { offset: -1, value: Some(2.0) },
                RadialSample { offset: 0, value: None },
                RadialSample { offset: 1, value: Some(2.0) },
            ],
        };
        assert_eq!(profile.max(), Some((-1, 2.0)));
    }

    #[test]
    fn test_sample_windowed_clips_to_raster() {
        let raster = GrayRaster::from_fn(4, 4, |x, y| (x + y) as f64);
        assert_relative_eq!(sample_windowed(&raster, 1, 1, 3).unwrap(), 2.0);
        // corner window only sees (0,0), (1,0), (0,1), (1,1)
        assert_relative_eq!(sample_windowed(&raster, 0, 0, 3).unwrap(), 1.0);
        assert_eq!(sample_windowed(&raster, -5, -5, 3), None);
    }
}
