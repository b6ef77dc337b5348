use crate::error::InputError;
use crate::io::input::Annotation;
use crate::processing::raster::GrayRaster;

/// A named precondition on an annotation/image pair.
pub struct IntegrityCheck {
    pub name: &'static str,
    check: fn(&Annotation, &GrayRaster) -> Result<(), InputError>,
}

impl IntegrityCheck {
    pub fn run(&self, annotation: &Annotation, image: &GrayRaster) -> Result<(), InputError> {
        (self.check)(annotation, image)
    }
}

/// Run in this order; the first failure stops the sequence.
pub const CHECKS: &[IntegrityCheck] = &[
    IntegrityCheck {
        name: "shapes present",
        check: shapes_present,
    },
    IntegrityCheck {
        name: "enough points",
        check: enough_points,
    },
    IntegrityCheck {
        name: "image size matches",
        check: size_matches,
    },
    IntegrityCheck {
        name: "points inside image",
        check: points_inside,
    },
];

pub fn check_inputs(annotation: &Annotation, image: &GrayRaster) -> Result<(), InputError> {
    for check in CHECKS {
        if let Err(err) = check.run(annotation, image) {
            log::warn!("Integrity check '{}' failed: {}", check.name, err);
            return Err(err);
        }
    }
    Ok(())
}

fn shapes_present(annotation: &Annotation, _: &GrayRaster) -> Result<(), InputError> {
    if annotation.shapes.is_empty() {
        return Err(InputError::NoShapes);
    }
    Ok(())
}

fn enough_points(annotation: &Annotation, _: &GrayRaster) -> Result<(), InputError> {
    let count: usize = annotation.shapes.iter().map(|s| s.points.len()).sum();
    match count {
        0 => Err(InputError::EmptyInput),
        n if n < 3 => Err(InputError::TooFewPoints(n)),
        _ => Ok(()),
    }
}

fn size_matches(annotation: &Annotation, image: &GrayRaster) -> Result<(), InputError> {
    if annotation.image_width != image.width() || annotation.image_height != image.height() {
        return Err(InputError::SizeMismatch {
            declared_width: annotation.image_width,
            declared_height: annotation.image_height,
            actual_width: image.width(),
            actual_height: image.height(),
        });
    }
    Ok(())
}

fn points_inside(annotation: &Annotation, _: &GrayRaster) -> Result<(), InputError> {
    let (width, height) = (annotation.image_width, annotation.image_height);
    for (index, p) in annotation.all_points().iter().enumerate() {
        let inside = p.x.is_finite()
            && p.y.is_finite()
            && (0.0..=width as f64).contains(&p.x)
            && (0.0..=height as f64).contains(&p.y);
        if !inside {
            return Err(InputError::PointOutsideImage {
                index,
                x: p.x,
                y: p.y,
                width,
                height,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod integrity_tests {
    use super::*;
    use crate::io::input::Shape;

    fn annotation(points: Vec<[f64; 2]>) -> Annotation {
        Annotation {
            image_height: 40,
            image_width: 60,
            shapes: vec![Shape {
                label: Some("tumor".to_string()),
                points,
            }],
        }
    }

    fn triangle() -> Vec<[f64; 2]> {
        vec![[5.0, 5.0], [50.0, 5.0], [20.0, 35.0]]
    }

    #[test]
    fn test_valid_pair_passes() {
        let image = GrayRaster::filled(60, 40, 0.0);
        assert!(check_inputs(&annotation(triangle()), &image).is_ok());
    }

    #[test]
    fn test_checks_report_first_failure() {
        let image = GrayRaster::filled(60, 40, 0.0);

        let mut none = annotation(triangle());
        none.shapes.clear();
        assert_eq!(check_inputs(&none, &image), Err(InputError::NoShapes));

        assert_eq!(
            check_inputs(&annotation(Vec::new()), &image),
            Err(InputError::EmptyInput)
        );
        assert_eq!(
            check_inputs(&annotation(vec![[1.0, 1.0], [2.0, 2.0]]), &image),
            Err(InputError::TooFewPoints(2))
        );

        // size is checked before point bounds
        let mut outside = triangle();
        outside.push([80.0, 10.0]);
        let small = GrayRaster::filled(30, 40, 0.0);
        assert!(matches!(
            check_inputs(&annotation(outside.clone()), &small),
            Err(InputError::SizeMismatch { actual_width: 30, .. })
        ));
        assert!(matches!(
            check_inputs(&annotation(outside), &image),
            Err(InputError::PointOutsideImage { index: 3, .. })
        ));

        let mut nan = triangle();
        nan[1][0] = f64::NAN;
        assert!(matches!(
            check_inputs(&annotation(nan), &image),
            Err(InputError::PointOutsideImage { index: 1, .. })
        ));
    }

    #[test]
    fn test_check_order_is_stable() {
        let names: Vec<&str> = CHECKS.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "shapes present",
                "enough points",
                "image size matches",
                "points inside image"
            ]
        );
    }
}
