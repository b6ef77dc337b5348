use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::io::output::{write_analysis_json, write_json, write_overlay_csv};
use crate::io::LoadedCase;
use crate::processing::config::AnalysisConfig;
use crate::processing::scoring::{Confidence, Stage};
use crate::processing::{analyze, Analysis};

pub const SUMMARY_FILE: &str = "analysis_summary.json";

/// Loads, checks and analyzes one image/annotation pair. With `output_dir`
/// set, writes `<stem>_analysis.json` and `<stem>_overlay.csv` there.
pub fn run_analysis<P: AsRef<Path>, Q: AsRef<Path>>(
    image_path: P,
    annotation_path: Q,
    config: &AnalysisConfig,
    output_dir: Option<&Path>,
) -> Result<Analysis> {
    let image_path = image_path.as_ref();
    log::info!("Analyzing {}", image_path.display());

    let case = LoadedCase::load(image_path, annotation_path)?;
    let analysis = analyze(&case.image, &case.annotation.all_points(), config)
        .with_context(|| format!("analysis of {:?} failed", image_path))?;

    if let Some(dir) = output_dir {
        let stem = file_stem(image_path);
        write_analysis_json(dir.join(format!("{}_analysis.json", stem)), &analysis.result)?;
        write_overlay_csv(dir.join(format!("{}_overlay.csv", stem)), &analysis.overlay())?;
    }
    Ok(analysis)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "case".to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Expected T category from names like `Chemo_4MC_1444273 (1).jpg` or
/// `Surgery_2M_1483646.jpg`.
pub fn expected_stage_from_name(name: &str) -> Option<String> {
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() < 3 {
        return None;
    }
    parts[1..parts.len() - 1].iter().find_map(|part| {
        let mut chars = part.chars();
        let digit = chars.next().filter(|c| ('1'..='4').contains(c))?;
        matches!(chars.as_str(), "M" | "MC").then(|| format!("T{}", digit))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisCase {
    pub image_path: PathBuf,
    pub annotation_path: PathBuf,
    pub expected: Option<String>,
}

impl AnalysisCase {
    /// Pairs an image with `<annotations_dir>/<stem>.json` and reads the
    /// expected category from the file name.
    pub fn from_image<P: AsRef<Path>, Q: AsRef<Path>>(image_path: P, annotations_dir: Q) -> Self {
        let image_path = image_path.as_ref().to_path_buf();
        let annotation_path = annotations_dir
            .as_ref()
            .join(format!("{}.json", file_stem(&image_path)));
        let expected = expected_stage_from_name(&file_name(&image_path));
        Self {
            image_path,
            annotation_path,
            expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub image: String,
    pub expected: Option<String>,
    pub predicted: Option<Stage>,
    pub confidence: Option<Confidence>,
    pub sii: Option<f64>,
    pub bci: Option<f64>,
    pub cri: Option<f64>,
    pub composite_score: Option<f64>,
    pub total_danger_regions: Option<usize>,
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl CaseSummary {
    fn new(case: &AnalysisCase, outcome: Result<Analysis>) -> Self {
        let mut summary = CaseSummary {
            image: file_name(&case.image_path),
            expected: case.expected.clone(),
            predicted: None,
            confidence: None,
            sii: None,
            bci: None,
            cri: None,
            composite_score: None,
            total_danger_regions: None,
            explanation: None,
            error: None,
        };
        match outcome {
            Ok(analysis) => {
                let r = analysis.result;
                summary.predicted = Some(r.predicted_t_stage);
                summary.confidence = Some(r.confidence);
                summary.sii = Some(r.sii);
                summary.bci = Some(r.bci);
                summary.cri = Some(r.cri);
                summary.composite_score = Some(r.composite_score);
                summary.total_danger_regions = Some(r.total_danger_regions);
                summary.explanation = Some(r.explanation);
            }
            Err(err) => {
                log::warn!("Skipping {}: {:#}", summary.image, err);
                summary.error = Some(format!("{:#}", err));
            }
        }
        summary
    }

    /// `None` unless the case has both an expected category and a prediction.
    pub fn is_correct(&self) -> Option<bool> {
        match (&self.expected, &self.predicted) {
            (Some(expected), Some(predicted)) => Some(predicted.covers(expected)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub cases: Vec<CaseSummary>,
    pub correct: usize,
    pub evaluated: usize,
    pub accuracy: f64,
}

impl BatchSummary {
    pub fn from_cases(cases: Vec<CaseSummary>) -> Self {
        let verdicts: Vec<bool> = cases.iter().filter_map(CaseSummary::is_correct).collect();
        let correct = verdicts.iter().filter(|&&ok| ok).count();
        let evaluated = verdicts.len();
        let accuracy = if evaluated > 0 {
            correct as f64 / evaluated as f64
        } else {
            0.0
        };
        Self {
            cases,
            correct,
            evaluated,
            accuracy,
        }
    }
}

/// Analyzes every case in parallel. A failing case is recorded with its
/// reason and does not stop the batch.
pub fn run_batch(
    cases: &[AnalysisCase],
    config: &AnalysisConfig,
    output_dir: Option<&Path>,
) -> Result<BatchSummary> {
    config.validate()?;
    log::info!("Starting batch of {} cases", cases.len());

    let summaries: Vec<CaseSummary> = cases
        .par_iter()
        .map(|case| {
            let outcome = run_analysis(&case.image_path, &case.annotation_path, config, output_dir);
            CaseSummary::new(case, outcome)
        })
        .collect();

    let summary = BatchSummary::from_cases(summaries);
    log::info!(
        "Batch finished: {}/{} correct ({:.1}%)",
        summary.correct,
        summary.evaluated,
        summary.accuracy * 100.0
    );

    if let Some(dir) = output_dir {
        write_json(dir.join(SUMMARY_FILE), &summary)?;
    }
    Ok(summary)
}
