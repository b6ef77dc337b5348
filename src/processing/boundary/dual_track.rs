use serde::{Deserialize, Serialize};

use super::{BoundaryAlgorithm, BoundaryContext, ScoreResult};
use crate::error::InputError;
use crate::processing::regions::{find_regions, RegionSpan};
use crate::processing::sampling::{pixel_of, sample_windowed};
use crate::utils::stats::{mean, pearson, percentile};

/// Compares tissue just inside and just outside the boundary. Where both
/// tracks move together the separating layer is presumed gone.
#[derive(Debug, Clone, Copy, Default)]
pub struct DualTrack;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualTrackResult {
    /// `None` where the track left the image.
    pub inner_values: Vec<Option<f64>>,
    pub outer_values: Vec<Option<f64>>,
    pub diff_values: Vec<Option<f64>>,
    pub local_correlations: Vec<f64>,
    pub mean_diff: f64,
    pub mean_correlation: f64,
    pub low_diff_threshold: f64,
    pub breach_regions: Vec<RegionSpan>,
    pub num_breach_regions: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackStatistics {
    pub diff_values: Vec<Option<f64>>,
    pub local_correlations: Vec<f64>,
}

/// Windowed intensities on the inner and outer track.
pub fn sample_tracks(ctx: &BoundaryContext<'_>) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let offset = ctx.config.track_offset as f64;
    let window = ctx.config.sample_window;

    ctx.contour
        .points
        .iter()
        .zip(ctx.contour.normals.iter())
        .map(|(point, normal)| {
            let inner = *point - *normal * offset;
            let outer = *point + *normal * offset;
            let (ix, iy) = pixel_of(inner.x, inner.y);
            let (ox, oy) = pixel_of(outer.x, outer.y);
            (
                sample_windowed(ctx.intensity, ix, iy, window),
                sample_windowed(ctx.intensity, ox, oy, window),
            )
        })
        .unzip()
}

/// Absolute track difference and circular sliding-window Pearson correlation.
/// Windows without two complete pairs, or without spread on either track,
/// correlate as 0.
pub fn track_statistics(
    inner: &[Option<f64>],
    outer: &[Option<f64>],
    window_size: usize,
) -> TrackStatistics {
    let n = inner.len().min(outer.len());
    let diff_values = inner[..n]
        .iter()
        .zip(&outer[..n])
        .map(|(i, o)| Some((o.as_ref()? - i.as_ref()?).abs()))
        .collect();

    let half = (window_size / 2) as isize;
    let local_correlations = (0..n as isize)
        .map(|i| {
            let (a, b): (Vec<f64>, Vec<f64>) = (i - half..=i + half)
                .filter_map(|k| {
                    let k = k.rem_euclid(n as isize) as usize;
                    Some((inner[k]?, outer[k]?))
                })
                .unzip();
            pearson(&a, &b).unwrap_or(0.0)
        })
        .collect();

    TrackStatistics {
        diff_values,
        local_correlations,
    }
}

impl BoundaryAlgorithm for DualTrack {
    type Output = DualTrackResult;

    fn name(&self) -> &'static str {
        "dual_track"
    }

    fn analyze(&self, ctx: &BoundaryContext<'_>) -> Result<DualTrackResult, InputError> {
        ctx.ensure_contour()?;
        let calibration = &ctx.config.calibration;

        let (inner_values, outer_values) = sample_tracks(ctx);
        let stats = track_statistics(&inner_values, &outer_values, ctx.config.window_size);

        let present_diffs: Vec<f64> = stats.diff_values.iter().flatten().copied().collect();
        let breach: Vec<bool> = stats
            .local_correlations
            .iter()
            .map(|&c| c > calibration.correlation_threshold)
            .collect();
        let breach_regions =
            find_regions(&breach, calibration.breach_min_length, calibration.region_gap);

        Ok(DualTrackResult {
            mean_diff: mean(&present_diffs),
            mean_correlation: mean(&stats.local_correlations),
            low_diff_threshold: percentile(&present_diffs, calibration.low_diff_percentile),
            num_breach_regions: breach_regions.len(),
            breach_regions,
            inner_values,
            outer_values,
            diff_values: stats.diff_values,
            local_correlations: stats.local_correlations,
        })
    }
}

impl ScoreResult for DualTrackResult {
    fn scores(&self) -> &[f64] {
        &self.local_correlations
    }

    fn regions(&self) -> &[RegionSpan] {
        &self.breach_regions
    }

    fn summary(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("mean_diff", self.mean_diff),
            ("mean_correlation", self.mean_correlation),
        ]
    }
}
