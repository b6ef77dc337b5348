pub mod boundary;
pub mod config;
pub mod contours;
pub mod morphology;
pub mod overlay;
pub mod raster;
pub mod regions;
pub mod sampling;
pub mod scoring;

use crate::error::InputError;
use crate::processing::boundary::{analyze_boundary, BoundaryContext};
use crate::processing::config::AnalysisConfig;
use crate::processing::contours::{regularize_with, Point, RegularContour};
use crate::processing::morphology::measure;
use crate::processing::overlay::BoundaryOverlay;
use crate::processing::raster::GrayRaster;
use crate::processing::scoring::{score_boundary, AnalysisResult};

/// Output of one analysis call: the regularized boundary the scores refer to
/// and the scored record.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub contour: RegularContour,
    pub result: AnalysisResult,
}

impl Analysis {
    pub fn overlay(&self) -> BoundaryOverlay {
        BoundaryOverlay::build(&self.contour, &self.result)
    }
}

/// Regularizes the lesion outline, measures it, runs the three boundary
/// algorithms over `image` and stages the result.
pub fn analyze(
    image: &GrayRaster,
    raw_points: &[Point],
    config: &AnalysisConfig,
) -> Result<Analysis, InputError> {
    config.validate()?;

    let contour = regularize_with(raw_points, config.target_points, config.smoothing_ratio)?;
    let morphology = measure(contour.points.as_slice(), config.pixel_spacing)?;

    let ctx = BoundaryContext::new(&contour, image, config);
    let boundary = analyze_boundary(&ctx, config.parallel)?;
    let result = score_boundary(boundary, morphology, &config.calibration);

    log::info!(
        "Predicted {} ({}) composite {:.3}, SII {:.3}, {} danger regions",
        result.predicted_t_stage,
        result.confidence,
        result.composite_score,
        result.sii,
        result.total_danger_regions
    );

    Ok(Analysis { contour, result })
}
