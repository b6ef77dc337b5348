pub mod entry;
pub mod error;
pub mod io;
pub mod processing;
pub mod utils;

#[cfg(feature = "python")]
mod python_bind;

pub use entry::{run_analysis, run_batch, AnalysisCase, BatchSummary, CaseSummary};
pub use error::InputError;
pub use processing::config::{AnalysisConfig, Calibration};
pub use processing::scoring::{AnalysisResult, Confidence, Stage};
pub use processing::{analyze, Analysis};

#[cfg(feature = "python")]
mod python_module {
    use pyo3::prelude::*;
    use pyo3::wrap_pyfunction;

    use crate::entry::run_analysis;
    use crate::processing::config::AnalysisConfig;
    use crate::python_bind::PyAnalysisSummary;

    /// Python wrapper around the single-image pipeline.
    ///
    /// Uses a Python‐friendly signature to allow defaults.
    #[pyfunction]
    #[pyo3(signature = (
        image_path,
        annotation_path,
        // defaults for the rest:
        tolerance_pixels = 8usize,
        track_offset = 5usize,
        window_size = 11usize,
        pixel_spacing = 0.1f64,
        target_points = 360usize
    ))]
    fn analyze_image_py(
        image_path: &str,
        annotation_path: &str,
        tolerance_pixels: usize,
        track_offset: usize,
        window_size: usize,
        pixel_spacing: f64,
        target_points: usize,
    ) -> PyResult<PyAnalysisSummary> {
        let config = AnalysisConfig {
            tolerance_pixels,
            track_offset,
            window_size,
            pixel_spacing,
            target_points,
            ..AnalysisConfig::default()
        };
        let analysis = run_analysis(image_path, annotation_path, &config, None)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(format!("{:#}", e)))?;
        Ok(analysis.into())
    }

    /// This is the module importable from Python:
    ///
    /// ```python
    /// import serosars
    /// summary = serosars.analyze_image_py("case.jpg", "case.json", pixel_spacing=0.08)
    /// print(summary.predicted_t_stage, summary.sii)
    /// ```
    #[pymodule]
    fn serosars(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add("__version__", env!("CARGO_PKG_VERSION"))?;
        m.add_function(wrap_pyfunction!(analyze_image_py, m)?)?;
        m.add_class::<PyAnalysisSummary>()?;
        Ok(())
    }
}
