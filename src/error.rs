use thiserror::Error;

/// Problems with the annotation, the image or the configuration handed to an
/// analysis call. These always reach the caller; nothing here is recovered
/// locally.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("annotation contains no points")]
    EmptyInput,

    #[error("contour contains no points")]
    EmptyContour,

    #[error("annotation contains no shapes")]
    NoShapes,

    #[error("polygon has {0} points, at least 3 are required")]
    TooFewPoints(usize),

    #[error("degenerate contour: {0}")]
    DegenerateContour(String),

    #[error(
        "image is {actual_width}x{actual_height} but annotation declares {declared_width}x{declared_height}"
    )]
    SizeMismatch {
        declared_width: u32,
        declared_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("annotation point {index} at ({x:.1}, {y:.1}) lies outside the {width}x{height} image")]
    PointOutsideImage {
        index: usize,
        x: f64,
        y: f64,
        width: u32,
        height: u32,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
