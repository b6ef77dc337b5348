use pyo3::prelude::*;

use crate::processing::scoring::AnalysisResult;
use crate::processing::Analysis;

/// Scalar outputs of one analysis; the full record is available via
/// `to_json()`.
#[pyclass]
#[derive(Debug, Clone)]
pub struct PyAnalysisSummary {
    #[pyo3(get)]
    pub sii: f64,
    #[pyo3(get)]
    pub bci: f64,
    #[pyo3(get)]
    pub cri: f64,
    #[pyo3(get)]
    pub composite_score: f64,
    #[pyo3(get)]
    pub predicted_t_stage: String,
    #[pyo3(get)]
    pub confidence: String,
    #[pyo3(get)]
    pub explanation: String,
    #[pyo3(get)]
    pub total_danger_regions: usize,
    #[pyo3(get)]
    pub equivalent_diameter_mm: f64,
    #[pyo3(get)]
    pub boundary_strengths: Vec<f64>,
    #[pyo3(get)]
    pub contour: Vec<(f64, f64)>,
    result: AnalysisResult,
}

#[pymethods]
impl PyAnalysisSummary {
    fn __repr__(&self) -> String {
        format!(
            "AnalysisSummary(stage={}, confidence={}, composite={:.3}, sii={:.3}, bci={:.3}, cri={:.3}, regions={})",
            self.predicted_t_stage,
            self.confidence,
            self.composite_score,
            self.sii,
            self.bci,
            self.cri,
            self.total_danger_regions
        )
    }

    fn __str__(&self) -> String {
        format!("{} ({}): {}", self.predicted_t_stage, self.confidence, self.explanation)
    }

    pub fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.result)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }
}

impl From<Analysis> for PyAnalysisSummary {
    fn from(analysis: Analysis) -> Self {
        let contour = analysis.contour.points.iter().map(|p| (p.x, p.y)).collect();
        let result = analysis.result;
        Self {
            sii: result.sii,
            bci: result.bci,
            cri: result.cri,
            composite_score: result.composite_score,
            predicted_t_stage: result.predicted_t_stage.to_string(),
            confidence: result.confidence.to_string(),
            explanation: result.explanation.clone(),
            total_danger_regions: result.total_danger_regions,
            equivalent_diameter_mm: result.morphology.equivalent_diameter_mm,
            boundary_strengths: result.algorithm1.boundary_strengths.clone(),
            contour,
            result,
        }
    }
}
