use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::processing::overlay::BoundaryOverlay;
use crate::processing::scoring::AnalysisResult;

/// Pretty-printed JSON; creates missing parent directories.
pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {:?}", parent))?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("failed to write JSON to {:?}", path))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {:?}", path))?;
    Ok(())
}

pub fn write_analysis_json<P: AsRef<Path>>(path: P, result: &AnalysisResult) -> anyhow::Result<()> {
    write_json(path, result)
}

/// One row per contour index, with a header row.
pub fn write_overlay_csv<P: AsRef<Path>>(path: P, overlay: &BoundaryOverlay) -> anyhow::Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {:?}", path))?;
    for point in &overlay.points {
        wtr.serialize(point)?;
    }
    wtr.flush()
        .with_context(|| format!("failed to flush {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod output_tests {
    use super::*;
    use crate::processing::overlay::OverlayPoint;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("serosars_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_overlay_csv_has_header_and_rows() {
        let dir = scratch_dir("overlay");
        std::fs::create_dir_all(&dir).unwrap();
        let overlay = BoundaryOverlay {
            points: (0..3)
                .map(|i| OverlayPoint {
                    index: i,
                    x: i as f64,
                    y: 2.0,
                    normal_x: 1.0,
                    normal_y: 0.0,
                    strength: 0.5,
                    correlation: 0.1,
                    risk: 0.0,
                    combined_risk: 0.25,
                })
                .collect(),
        };
        let path = dir.join("case_overlay.csv");
        write_overlay_csv(&path, &overlay).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "index,x,y,normal_x,normal_y,strength,correlation,risk,combined_risk"
        );
        assert!(lines[2].starts_with("1,1.0,2.0"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_json_creates_parent_directories() {
        let dir = scratch_dir("json");
        let path = dir.join("nested").join("value.json");
        write_json(&path, &serde_json::json!({"sii": 0.4, "predicted_t_stage": "T2"})).unwrap();

        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["predicted_t_stage"], "T2");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_json_reports_failed_flush() {
        // writes to /dev/full fail with ENOSPC once the buffer is flushed
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let err = write_json(full, &serde_json::json!({"sii": 0.4})).unwrap_err();
        assert!(format!("{:#}", err).contains("/dev/full"));
    }
}
