use serde::{Deserialize, Serialize};

use super::{BoundaryAlgorithm, BoundaryContext, ScoreResult};
use crate::error::InputError;
use crate::processing::regions::{find_regions, RegionSpan};
use crate::processing::sampling::sample;
use crate::utils::stats::{mean, percentile};

/// Strongest normalized edge response inside a band around the boundary.
/// A real wall answers somewhere in the band; a breached one stays weak
/// across all of it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalGradient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalGradientResult {
    pub boundary_strengths: Vec<f64>,
    /// Offset along the normal where the strongest response was found.
    pub best_offsets: Vec<i32>,
    pub weakest_10_percentile: f64,
    pub mean_strength: f64,
    pub weak_regions: Vec<RegionSpan>,
    pub num_weak_regions: usize,
}

/// Per-point band maximum of the normalized gradient and its offset.
/// Points whose band is entirely outside the image, or flat zero, score 0 at
/// offset 0.
pub fn boundary_strengths(ctx: &BoundaryContext<'_>) -> Result<(Vec<f64>, Vec<i32>), InputError> {
    ctx.ensure_contour()?;
    let tolerance = ctx.config.tolerance_pixels;

    Ok(ctx
        .contour
        .points
        .iter()
        .zip(ctx.contour.normals.iter())
        .map(|(point, normal)| {
            let profile = sample(&ctx.gradient, point, normal, tolerance, tolerance);
            match profile.max() {
                Some((offset, value)) if value > 0.0 => (value, offset),
                _ => (0.0, 0),
            }
        })
        .unzip())
}

impl BoundaryAlgorithm for NormalGradient {
    type Output = NormalGradientResult;

    fn name(&self) -> &'static str {
        "normal_gradient"
    }

    fn analyze(&self, ctx: &BoundaryContext<'_>) -> Result<NormalGradientResult, InputError> {
        let calibration = &ctx.config.calibration;
        let (strengths, offsets) = boundary_strengths(ctx)?;

        let weak: Vec<bool> = strengths
            .iter()
            .map(|&s| s < calibration.weak_threshold)
            .collect();
        let weak_regions = find_regions(&weak, calibration.weak_min_length, calibration.region_gap);

        Ok(NormalGradientResult {
            weakest_10_percentile: percentile(&strengths, calibration.weakest_percentile),
            mean_strength: mean(&strengths),
            num_weak_regions: weak_regions.len(),
            weak_regions,
            boundary_strengths: strengths,
            best_offsets: offsets,
        })
    }
}

impl ScoreResult for NormalGradientResult {
    fn scores(&self) -> &[f64] {
        &self.boundary_strengths
    }

    fn regions(&self) -> &[RegionSpan] {
        &self.weak_regions
    }

    fn summary(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("weakest_10_percentile", self.weakest_10_percentile),
            ("mean_strength", self.mean_strength),
        ]
    }
}
