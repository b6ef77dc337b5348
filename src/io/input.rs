use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::processing::contours::Point;
use crate::processing::raster::GrayRaster;

pub const DEFAULT_IMAGE_HEIGHT: u32 = 960;
pub const DEFAULT_IMAGE_WIDTH: u32 = 1280;

fn default_height() -> u32 {
    DEFAULT_IMAGE_HEIGHT
}

fn default_width() -> u32 {
    DEFAULT_IMAGE_WIDTH
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(default)]
    pub label: Option<String>,
    pub points: Vec<[f64; 2]>,
}

/// Polygon annotation as written by common labeling tools. Unknown fields
/// are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "imageHeight", default = "default_height")]
    pub image_height: u32,
    #[serde(rename = "imageWidth", default = "default_width")]
    pub image_width: u32,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl Annotation {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse annotation JSON")
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read annotation {:?}", path.as_ref()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("invalid annotation {:?}", path.as_ref()))
    }

    /// Points of every shape, in file order.
    pub fn all_points(&self) -> Vec<Point> {
        self.shapes
            .iter()
            .flat_map(|s| s.points.iter().map(|[x, y]| Point::new(*x, *y)))
            .collect()
    }
}

/// Decodes any format the `image` crate knows and converts it to 8-bit luma.
pub fn load_grayscale<P: AsRef<Path>>(path: P) -> Result<GrayRaster> {
    let image = image::open(&path)
        .with_context(|| format!("failed to load image {:?}", path.as_ref()))?;
    Ok(GrayRaster::from_luma(&image.to_luma8()))
}
