use serde::{Deserialize, Serialize};
use std::fmt;

use crate::processing::boundary::{
    BoundaryResults, CurvatureRiskResult, DualTrackResult, NormalGradientResult, ScoreResult,
};
use crate::processing::config::Calibration;
use crate::processing::morphology::MorphologyRecord;

pub const SII_WEIGHT: f64 = 0.5;
pub const BCI_WEIGHT: f64 = 0.3;
pub const CRI_WEIGHT: f64 = 0.2;

/// Tumor depth category. The serialized labels are read by report tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "T1-T2")]
    T1T2,
    #[serde(rename = "T2")]
    T2,
    #[serde(rename = "T2-T3")]
    T2T3,
    #[serde(rename = "T3")]
    T3,
    #[serde(rename = "T3-T4")]
    T3T4,
    #[serde(rename = "T4")]
    T4,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::T1T2 => "T1-T2",
            Stage::T2 => "T2",
            Stage::T2T3 => "T2-T3",
            Stage::T3 => "T3",
            Stage::T3T4 => "T3-T4",
            Stage::T4 => "T4",
        }
    }

    /// Whether the label names category `fragment`, e.g. "T3" in "T3-T4".
    pub fn covers(&self, fragment: &str) -> bool {
        self.label().contains(fragment)
    }

    /// One step deeper for the two single-category labels that can still
    /// move; every other label is returned unchanged.
    pub fn escalated(self) -> Stage {
        match self {
            Stage::T2 => Stage::T2T3,
            Stage::T3 => Stage::T3T4,
            other => other,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBand {
    Small,
    Medium,
    Large,
    Huge,
}

impl SizeBand {
    /// Bands on equivalent diameter: <15, 15-30, 30-50, >=50 mm.
    pub fn from_diameter_mm(diameter: f64) -> SizeBand {
        if diameter < 15.0 {
            SizeBand::Small
        } else if diameter < 30.0 {
            SizeBand::Medium
        } else if diameter < 50.0 {
            SizeBand::Large
        } else {
            SizeBand::Huge
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SizeBand::Small => "small",
            SizeBand::Medium => "medium",
            SizeBand::Large => "large",
            SizeBand::Huge => "very large",
        }
    }
}

/// Values the staging table is keyed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagingEvidence {
    pub sii: f64,
    pub diameter_mm: f64,
    pub circularity: f64,
    pub irregularity: f64,
}

impl StagingEvidence {
    pub fn new(sii: f64, morphology: &MorphologyRecord) -> Self {
        Self {
            sii,
            diameter_mm: morphology.equivalent_diameter_mm,
            circularity: morphology.circularity,
            irregularity: morphology.irregularity,
        }
    }
}

/// One row of the staging table. Every bound is strict; `None` means the
/// row does not look at that value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagingRule {
    pub band: SizeBand,
    pub sii_above: Option<f64>,
    pub circularity_above: Option<f64>,
    pub irregularity_below: Option<f64>,
    pub stage: Stage,
    pub confidence: Confidence,
    pub finding: &'static str,
}

impl StagingRule {
    const fn new(band: SizeBand, stage: Stage, confidence: Confidence, finding: &'static str) -> Self {
        Self {
            band,
            sii_above: None,
            circularity_above: None,
            irregularity_below: None,
            stage,
            confidence,
            finding,
        }
    }

    const fn sii_above(mut self, value: f64) -> Self {
        self.sii_above = Some(value);
        self
    }

    const fn regular(mut self, circularity: f64, irregularity: f64) -> Self {
        self.circularity_above = Some(circularity);
        self.irregularity_below = Some(irregularity);
        self
    }

    pub fn matches(&self, e: &StagingEvidence) -> bool {
        self.band == SizeBand::from_diameter_mm(e.diameter_mm)
            && self.sii_above.map_or(true, |t| e.sii > t)
            && self.circularity_above.map_or(true, |t| e.circularity > t)
            && self.irregularity_below.map_or(true, |t| e.irregularity < t)
    }

    pub fn explain(&self, e: &StagingEvidence) -> String {
        format!(
            "{} tumor (diameter {:.1} mm, SII {:.2}): {}",
            self.band.name(),
            e.diameter_mm,
            e.sii,
            self.finding
        )
    }
}

/// Evaluated top to bottom; the first matching row decides. Each band ends
/// with an unconditional row.
pub const STAGING_RULES: &[StagingRule] = &[
    StagingRule::new(SizeBand::Small, Stage::T1T2, Confidence::Medium, "regular shape with a visible boundary, early stage likely")
        .regular(0.7, 1.3)
        .sii_above(0.2),
    StagingRule::new(SizeBand::Small, Stage::T2T3, Confidence::Low, "regular shape but weak boundary, needs further assessment")
        .regular(0.7, 1.3),
    StagingRule::new(SizeBand::Small, Stage::T2T3, Confidence::Low, "irregular shape, combined assessment advised"),
    StagingRule::new(SizeBand::Medium, Stage::T2, Confidence::Medium, "clear boundary, T2 likely")
        .sii_above(0.35)
        .regular(0.6, f64::INFINITY),
    StagingRule::new(SizeBand::Medium, Stage::T3, Confidence::Medium, "moderate boundary, T3 likely")
        .sii_above(0.25),
    StagingRule::new(SizeBand::Medium, Stage::T3T4, Confidence::Medium, "weak boundary, possible serosal invasion")
        .sii_above(0.15),
    StagingRule::new(SizeBand::Medium, Stage::T4, Confidence::High, "blurred boundary, T4 strongly suspected"),
    StagingRule::new(SizeBand::Large, Stage::T3, Confidence::Medium, "visible boundary, T3 likely")
        .sii_above(0.3),
    StagingRule::new(SizeBand::Large, Stage::T3T4, Confidence::Medium, "weak boundary, possible serosal invasion")
        .sii_above(0.2),
    StagingRule::new(SizeBand::Large, Stage::T4, Confidence::High, "blurred boundary, serosal breach strongly suspected"),
    StagingRule::new(SizeBand::Huge, Stage::T3T4, Confidence::Medium, "boundary partly visible")
        .sii_above(0.25),
    StagingRule::new(SizeBand::Huge, Stage::T4, Confidence::High, "blurred boundary, T4 strongly suspected"),
];

const UNMATCHED: StagingRule = StagingRule::new(
    SizeBand::Huge,
    Stage::T4,
    Confidence::High,
    "boundary metrics could not be staged",
);

#[derive(Debug, Clone, PartialEq)]
pub struct StagingDecision {
    pub stage: Stage,
    pub confidence: Confidence,
    pub explanation: String,
}

/// Size-gated table lookup followed by the region-count escalation.
pub fn decide_stage(
    evidence: &StagingEvidence,
    total_regions: usize,
    calibration: &Calibration,
) -> StagingDecision {
    let rule = STAGING_RULES
        .iter()
        .find(|r| r.matches(evidence))
        .unwrap_or(&UNMATCHED);
    log::debug!("Staging rule hit: {} / {}", rule.stage, rule.finding);

    let mut decision = StagingDecision {
        stage: rule.stage,
        confidence: rule.confidence,
        explanation: rule.explain(evidence),
    };

    if total_regions >= calibration.escalation_region_count && !decision.stage.covers("T4") {
        let escalated = decision.stage.escalated();
        if escalated != decision.stage {
            log::debug!("Escalating {} to {} ({} regions)", decision.stage, escalated, total_regions);
        }
        decision.stage = escalated;
        decision
            .explanation
            .push_str(&format!("; {} danger regions found", total_regions));
    }
    decision
}

/// Per-image analysis record handed to report and storage layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sii: f64,
    pub bci: f64,
    pub cri: f64,
    pub composite_score: f64,
    pub predicted_t_stage: Stage,
    pub confidence: Confidence,
    pub explanation: String,
    pub morphology: MorphologyRecord,
    pub algorithm1: NormalGradientResult,
    pub algorithm2: DualTrackResult,
    pub algorithm3: CurvatureRiskResult,
    pub total_danger_regions: usize,
}

pub fn composite(sii: f64, bci: f64, cri: f64) -> f64 {
    SII_WEIGHT * sii + BCI_WEIGHT * bci + CRI_WEIGHT * cri
}

pub fn score(
    algorithm1: NormalGradientResult,
    algorithm2: DualTrackResult,
    algorithm3: CurvatureRiskResult,
    morphology: MorphologyRecord,
    calibration: &Calibration,
) -> AnalysisResult {
    let sii = algorithm1.weakest_10_percentile;
    let bci = 1.0 - algorithm2.mean_correlation.clamp(0.0, 1.0);
    let cri = 1.0 - algorithm3.mean_risk;
    let total_danger_regions =
        algorithm1.region_count() + algorithm2.region_count() + algorithm3.region_count();

    let decision = decide_stage(
        &StagingEvidence::new(sii, &morphology),
        total_danger_regions,
        calibration,
    );

    AnalysisResult {
        sii,
        bci,
        cri,
        composite_score: composite(sii, bci, cri),
        predicted_t_stage: decision.stage,
        confidence: decision.confidence,
        explanation: decision.explanation,
        morphology,
        algorithm1,
        algorithm2,
        algorithm3,
        total_danger_regions,
    }
}

/// [`score`] over the joined output of `analyze_boundary`.
pub fn score_boundary(
    results: BoundaryResults,
    morphology: MorphologyRecord,
    calibration: &Calibration,
) -> AnalysisResult {
    score(
        results.gradient,
        results.dual_track,
        results.curvature,
        morphology,
        calibration,
    )
}
