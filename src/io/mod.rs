pub mod input;
pub mod integrity_check;
pub mod output;

use anyhow::Context;
use std::path::Path;

use crate::io::input::{load_grayscale, Annotation};
use crate::io::integrity_check::check_inputs;
use crate::processing::raster::GrayRaster;

/// An image and its lesion annotation, checked against each other.
#[derive(Debug, Clone)]
pub struct LoadedCase {
    pub image: GrayRaster,
    pub annotation: Annotation,
}

impl LoadedCase {
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        image_path: P,
        annotation_path: Q,
    ) -> anyhow::Result<Self> {
        let image = load_grayscale(&image_path)?;
        let annotation = Annotation::from_json_file(&annotation_path)?;
        check_inputs(&annotation, &image).with_context(|| {
            format!(
                "{:?} does not match annotation {:?}",
                image_path.as_ref(),
                annotation_path.as_ref()
            )
        })?;
        log::debug!(
            "Loaded {}x{} image with {} annotation points",
            image.width(),
            image.height(),
            annotation.all_points().len()
        );
        Ok(Self { image, annotation })
    }
}
