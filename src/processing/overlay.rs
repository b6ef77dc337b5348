use serde::{Deserialize, Serialize};

use crate::processing::boundary::ScoreResult;
use crate::processing::contours::RegularContour;
use crate::processing::scoring::AnalysisResult;
use crate::utils::stats::percentile;

const DIFF_PERCENTILE: f64 = 95.0;

/// Per-point boundary readings laid out for report rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub normal_x: f64,
    pub normal_y: f64,
    pub strength: f64,
    pub correlation: f64,
    pub risk: f64,
    pub combined_risk: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryOverlay {
    pub points: Vec<OverlayPoint>,
}

impl BoundaryOverlay {
    /// Combined risk `0.5·(1 - strength) + 0.3·(1 - diff/p95) + 0.2·risk`;
    /// a missing track difference counts as 0.
    pub fn build(contour: &RegularContour, result: &AnalysisResult) -> Self {
        let a = &result.algorithm1;
        let b = &result.algorithm2;
        let c = &result.algorithm3;

        let diffs: Vec<f64> = b.diff_values.iter().map(|d| d.unwrap_or(0.0)).collect();
        let diff_scale = percentile(&diffs, DIFF_PERCENTILE) + 1e-6;

        let points = contour
            .points
            .iter()
            .zip(contour.normals.iter())
            .enumerate()
            .map(|(i, (p, n))| {
                let strength = score_at(a, i);
                let correlation = score_at(b, i);
                let risk = score_at(c, i);
                let diff = diffs.get(i).copied().unwrap_or(0.0);
                let combined_risk =
                    0.5 * (1.0 - strength) + 0.3 * (1.0 - diff / diff_scale) + 0.2 * risk;
                OverlayPoint {
                    index: i,
                    x: p.x,
                    y: p.y,
                    normal_x: n.x,
                    normal_y: n.y,
                    strength,
                    correlation,
                    risk,
                    combined_risk,
                }
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point with the highest combined risk.
    pub fn peak(&self) -> Option<&OverlayPoint> {
        self.points
            .iter()
            .max_by(|a, b| a.combined_risk.total_cmp(&b.combined_risk))
    }
}

fn score_at<R: ScoreResult>(result: &R, i: usize) -> f64 {
    result.scores().get(i).copied().unwrap_or(0.0)
}
