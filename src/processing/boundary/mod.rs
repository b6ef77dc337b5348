//! Three independent readings of boundary integrity over one regularized
//! contour. Each algorithm only reads the shared [`BoundaryContext`], so they
//! can run in any order or concurrently.

pub mod curvature_risk;
pub mod dual_track;
pub mod normal_gradient;

use crossbeam::thread;
use std::panic::resume_unwind;

use crate::error::InputError;
use crate::processing::config::AnalysisConfig;
use crate::processing::contours::RegularContour;
use crate::processing::raster::GrayRaster;
use crate::processing::regions::RegionSpan;

pub use curvature_risk::{CurvatureRisk, CurvatureRiskResult};
pub use dual_track::{DualTrack, DualTrackResult};
pub use normal_gradient::{NormalGradient, NormalGradientResult};

/// Read-only inputs shared by all boundary algorithms of one analysis call.
#[derive(Debug)]
pub struct BoundaryContext<'a> {
    pub contour: &'a RegularContour,
    pub intensity: &'a GrayRaster,
    /// Gradient magnitude scaled by its image-wide high percentile.
    pub gradient: GrayRaster,
    pub config: &'a AnalysisConfig,
}

impl<'a> BoundaryContext<'a> {
    /// Derives the normalized Sobel gradient magnitude from `intensity`.
    pub fn new(
        contour: &'a RegularContour,
        intensity: &'a GrayRaster,
        config: &'a AnalysisConfig,
    ) -> Self {
        let magnitude = intensity.sobel_magnitude();
        Self::with_gradient(contour, intensity, &magnitude, config)
    }

    /// Uses a precomputed gradient magnitude raster instead of deriving one.
    pub fn with_gradient(
        contour: &'a RegularContour,
        intensity: &'a GrayRaster,
        magnitude: &GrayRaster,
        config: &'a AnalysisConfig,
    ) -> Self {
        let gradient = magnitude.normalized_by_percentile(config.calibration.gradient_percentile);
        Self {
            contour,
            intensity,
            gradient,
            config,
        }
    }

    fn ensure_contour(&self) -> Result<(), InputError> {
        if self.contour.is_empty() {
            return Err(InputError::EmptyContour);
        }
        Ok(())
    }
}

/// Common view over the per-point output of a boundary algorithm.
pub trait ScoreResult {
    /// One score per contour index.
    fn scores(&self) -> &[f64];

    fn regions(&self) -> &[RegionSpan];

    fn region_count(&self) -> usize {
        self.regions().len()
    }

    /// Named summary scalars.
    fn summary(&self) -> Vec<(&'static str, f64)>;
}

pub trait BoundaryAlgorithm: Sync {
    type Output: ScoreResult + Send;

    fn name(&self) -> &'static str;

    fn analyze(&self, ctx: &BoundaryContext<'_>) -> Result<Self::Output, InputError>;
}

pub fn run_algorithm<A: BoundaryAlgorithm>(
    algorithm: &A,
    ctx: &BoundaryContext<'_>,
) -> Result<A::Output, InputError> {
    let output = algorithm.analyze(ctx)?;
    log::debug!(
        "{}: {} regions, {:?}",
        algorithm.name(),
        output.region_count(),
        output.summary()
    );
    Ok(output)
}

#[derive(Debug, Clone)]
pub struct BoundaryResults {
    pub gradient: NormalGradientResult,
    pub dual_track: DualTrackResult,
    pub curvature: CurvatureRiskResult,
}

impl BoundaryResults {
    pub fn total_regions(&self) -> usize {
        self.gradient.region_count() + self.dual_track.region_count() + self.curvature.region_count()
    }
}

/// Runs all three algorithms, on scoped threads when `parallel` is set.
pub fn analyze_boundary(
    ctx: &BoundaryContext<'_>,
    parallel: bool,
) -> Result<BoundaryResults, InputError> {
    ctx.ensure_contour()?;

    if !parallel {
        return Ok(BoundaryResults {
            gradient: run_algorithm(&NormalGradient, ctx)?,
            dual_track: run_algorithm(&DualTrack, ctx)?,
            curvature: run_algorithm(&CurvatureRisk, ctx)?,
        });
    }

    let joined = thread::scope(|s| {
        let gradient = s.spawn(|_| run_algorithm(&NormalGradient, ctx));
        let dual_track = s.spawn(|_| run_algorithm(&DualTrack, ctx));
        let curvature = run_algorithm(&CurvatureRisk, ctx);
        (gradient.join(), dual_track.join(), curvature)
    });
    let (gradient, dual_track, curvature) = joined.unwrap_or_else(|panic| resume_unwind(panic));

    Ok(BoundaryResults {
        gradient: gradient.unwrap_or_else(|panic| resume_unwind(panic))?,
        dual_track: dual_track.unwrap_or_else(|panic| resume_unwind(panic))?,
        curvature: curvature?,
    })
}

#[cfg(test)]
mod boundary_tests {
    use super::*;
    use crate::processing::contours::CircularSeq;
    use crate::utils::test_utils::{circle_contour, gradient_ring_raster, SyntheticRing};

    #[test]
    fn test_parallel_and_sequential_runs_agree() {
        let config = AnalysisConfig::default();
        let contour = circle_contour(100.0, (160.0, 160.0), 360);
        let ring = SyntheticRing {
            gap_degrees: Some((200.0, 240.0)),
            ..SyntheticRing::default()
        };
        let gradient = gradient_ring_raster(320, 320, (160.0, 160.0), 100.0, &ring);
        let intensity = GrayRaster::from_fn(320, 320, |x, y| ((x * 7 + y * 3) % 50) as f64);
        let ctx = BoundaryContext::with_gradient(&contour, &intensity, &gradient, &config);

        let sequential = analyze_boundary(&ctx, false).unwrap();
        let parallel = analyze_boundary(&ctx, true).unwrap();
        assert_eq!(sequential.gradient, parallel.gradient);
        assert_eq!(sequential.dual_track, parallel.dual_track);
        assert_eq!(sequential.curvature, parallel.curvature);
        assert_eq!(sequential.total_regions(), parallel.total_regions());
    }

    #[test]
    fn test_empty_contour_is_rejected() {
        let config = AnalysisConfig::default();
        let contour = RegularContour {
            points: CircularSeq::new(Vec::new()),
            normals: CircularSeq::new(Vec::new()),
            curvature: CircularSeq::new(Vec::new()),
        };
        let intensity = GrayRaster::filled(10, 10, 0.0);
        let ctx = BoundaryContext::new(&contour, &intensity, &config);

        assert_eq!(
            analyze_boundary(&ctx, true).unwrap_err(),
            InputError::EmptyContour
        );
        assert_eq!(
            NormalGradient.analyze(&ctx).unwrap_err(),
            InputError::EmptyContour
        );
        assert_eq!(DualTrack.analyze(&ctx).unwrap_err(), InputError::EmptyContour);
        assert_eq!(
            CurvatureRisk.analyze(&ctx).unwrap_err(),
            InputError::EmptyContour
        );
    }
}
