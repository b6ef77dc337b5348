use serde::{Deserialize, Serialize};

use super::normal_gradient::boundary_strengths;
use super::{BoundaryAlgorithm, BoundaryContext, ScoreResult};
use crate::error::InputError;
use crate::processing::config::Calibration;
use crate::processing::regions::{find_regions, RegionSpan};
use crate::utils::stats::{circular_moving_average, mean, percentile};

/// Sharp outward bulges that carry no edge response. Pairs the contour
/// curvature with the band strength of [`super::NormalGradient`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CurvatureRisk;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvatureRiskResult {
    pub curvatures: Vec<f64>,
    pub normalized_curvature: Vec<f64>,
    /// Smoothed per-point risk.
    pub risk_scores: Vec<f64>,
    pub max_risk: f64,
    pub mean_risk: f64,
    pub high_risk_regions: Vec<RegionSpan>,
    pub num_high_risk_regions: usize,
}

/// Positive curvature scaled by its high percentile, times the missing edge
/// strength, then circularly smoothed. Returns the normalized curvature and
/// the smoothed risk.
pub fn fuse_risk(
    curvatures: &[f64],
    strengths: &[f64],
    calibration: &Calibration,
) -> (Vec<f64>, Vec<f64>) {
    let positive: Vec<f64> = curvatures.iter().map(|&k| k.max(0.0)).collect();
    let scale = percentile(&positive, calibration.curvature_percentile);
    let normalized: Vec<f64> = if scale > 0.0 {
        positive.iter().map(|k| k / scale).collect()
    } else {
        positive
    };

    let raw: Vec<f64> = normalized
        .iter()
        .zip(strengths)
        .map(|(k, s)| k * (1.0 - s.clamp(0.0, 1.0)))
        .collect();
    let smoothed = circular_moving_average(&raw, calibration.risk_smoothing_window);
    (normalized, smoothed)
}

impl BoundaryAlgorithm for CurvatureRisk {
    type Output = CurvatureRiskResult;

    fn name(&self) -> &'static str {
        "curvature_risk"
    }

    fn analyze(&self, ctx: &BoundaryContext<'_>) -> Result<CurvatureRiskResult, InputError> {
        let calibration = &ctx.config.calibration;
        let (strengths, _) = boundary_strengths(ctx)?;
        let curvatures = ctx.contour.curvature.as_slice().to_vec();

        let (normalized_curvature, risk_scores) = fuse_risk(&curvatures, &strengths, calibration);

        let threshold = percentile(&risk_scores, calibration.risk_percentile);
        let high: Vec<bool> = risk_scores.iter().map(|&r| r > threshold).collect();
        let high_risk_regions =
            find_regions(&high, calibration.risk_min_length, calibration.region_gap);

        Ok(CurvatureRiskResult {
            max_risk: risk_scores.iter().copied().fold(0.0, f64::max),
            mean_risk: mean(&risk_scores),
            num_high_risk_regions: high_risk_regions.len(),
            high_risk_regions,
            curvatures,
            normalized_curvature,
            risk_scores,
        })
    }
}

impl ScoreResult for CurvatureRiskResult {
    fn scores(&self) -> &[f64] {
        &self.risk_scores
    }

    fn regions(&self) -> &[RegionSpan] {
        &self.high_risk_regions
    }

    fn summary(&self) -> Vec<(&'static str, f64)> {
        vec![("max_risk", self.max_risk), ("mean_risk", self.mean_risk)]
    }
}
