use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::processing::contours::DEFAULT_SMOOTHING_RATIO;

/// Per-call analysis parameters. Immutable once handed to `analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Half-width of the band searched along each normal (pixels).
    pub tolerance_pixels: usize,
    /// Distance of the inner and outer tracks from the boundary (pixels).
    pub track_offset: usize,
    /// Sliding window for local track correlation (odd, contour points).
    pub window_size: usize,
    /// Physical size of one pixel (mm).
    pub pixel_spacing: f64,
    /// Number of points the boundary is resampled to.
    pub target_points: usize,
    pub smoothing_ratio: f64,
    /// Square neighbourhood averaged by the windowed sampler (odd, pixels).
    pub sample_window: usize,
    /// Run the three boundary algorithms on separate threads.
    pub parallel: bool,
    pub calibration: Calibration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tolerance_pixels: 8,
            track_offset: 5,
            window_size: 11,
            pixel_spacing: 0.1,
            target_points: 360,
            smoothing_ratio: DEFAULT_SMOOTHING_RATIO,
            sample_window: 3,
            parallel: true,
            calibration: Calibration::default(),
        }
    }
}

/// Empirical thresholds tuned on gastric ultrasound annotations. They are
/// calibration values for that modality, not physical constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Normalized strength below which a boundary point counts as weak.
    pub weak_threshold: f64,
    pub weak_min_length: usize,
    /// Local correlation above which inner and outer tissue look alike.
    pub correlation_threshold: f64,
    pub breach_min_length: usize,
    /// Percentile of the smoothed risk above which a point is high risk.
    pub risk_percentile: f64,
    pub risk_min_length: usize,
    /// Largest index step still treated as contiguous when merging regions.
    pub region_gap: usize,
    pub gradient_percentile: f64,
    pub curvature_percentile: f64,
    pub weakest_percentile: f64,
    pub low_diff_percentile: f64,
    pub risk_smoothing_window: usize,
    /// Total flagged regions that escalate a stage by one step.
    pub escalation_region_count: usize,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            weak_threshold: 0.15,
            weak_min_length: 5,
            correlation_threshold: 0.5,
            breach_min_length: 5,
            risk_percentile: 90.0,
            risk_min_length: 3,
            region_gap: 2,
            gradient_percentile: 99.0,
            curvature_percentile: 95.0,
            weakest_percentile: 10.0,
            low_diff_percentile: 20.0,
            risk_smoothing_window: 5,
            escalation_region_count: 5,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(text).context("failed to parse analysis configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(&path).with_context(|| {
            format!("failed to read configuration file {:?}", path.as_ref())
        })?;
        Self::from_toml_str(&text)
            .with_context(|| format!("invalid configuration file {:?}", path.as_ref()))
    }

    pub fn validate(&self) -> Result<(), InputError> {
        let invalid = |msg: String| -> Result<(), InputError> { Err(InputError::InvalidConfig(msg)) };

        if self.window_size < 3 || self.window_size % 2 == 0 {
            return invalid(format!(
                "window_size must be an odd integer >= 3, got {}",
                self.window_size
            ));
        }
        if self.sample_window == 0 || self.sample_window % 2 == 0 {
            return invalid(format!(
                "sample_window must be an odd positive integer, got {}",
                self.sample_window
            ));
        }
        if !self.pixel_spacing.is_finite() || self.pixel_spacing <= 0.0 {
            return invalid(format!(
                "pixel_spacing must be positive, got {}",
                self.pixel_spacing
            ));
        }
        if self.target_points < 3 {
            return invalid(format!(
                "target_points must be at least 3, got {}",
                self.target_points
            ));
        }
        if self.tolerance_pixels == 0 {
            return invalid("tolerance_pixels must be positive".to_string());
        }
        if self.track_offset == 0 {
            return invalid("track_offset must be positive".to_string());
        }
        if !self.smoothing_ratio.is_finite() || self.smoothing_ratio < 0.0 {
            return invalid(format!(
                "smoothing_ratio must be a non-negative number, got {}",
                self.smoothing_ratio
            ));
        }
        self.calibration.validate()
    }
}

impl Calibration {
    pub fn validate(&self) -> Result<(), InputError> {
        let percentiles = [
            ("risk_percentile", self.risk_percentile),
            ("gradient_percentile", self.gradient_percentile),
            ("curvature_percentile", self.curvature_percentile),
            ("weakest_percentile", self.weakest_percentile),
            ("low_diff_percentile", self.low_diff_percentile),
        ];
        for (name, value) in percentiles {
            if !(0.0..=100.0).contains(&value) {
                return Err(InputError::InvalidConfig(format!(
                    "{} must lie in [0, 100], got {}",
                    name, value
                )));
            }
        }
        if self.risk_smoothing_window == 0 || self.risk_smoothing_window % 2 == 0 {
            return Err(InputError::InvalidConfig(format!(
                "risk_smoothing_window must be an odd positive integer, got {}",
                self.risk_smoothing_window
            )));
        }
        Ok(())
    }
}
