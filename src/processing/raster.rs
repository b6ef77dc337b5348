use image::GrayImage;

use crate::utils::stats::percentile;

/// Single-channel floating point image, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayRaster {
    width: u32,
    height: u32,
    data: Vec<f64>,
}

impl GrayRaster {
    pub fn filled(width: u32, height: u32, value: f64) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    /// Builds a raster by evaluating `f(x, y)` at every pixel.
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> f64,
    {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_luma(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.as_raw().iter().map(|&v| v as f64).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Value at integer pixel coordinates, `None` outside the raster.
    pub fn get(&self, x: i64, y: i64) -> Option<f64> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.data[y as usize * self.width as usize + x as usize])
    }

    fn at_reflected(&self, x: i64, y: i64) -> f64 {
        let x = reflect_101(x, self.width as i64);
        let y = reflect_101(y, self.height as i64);
        self.data[y * self.width as usize + x]
    }

    /// 3x3 Sobel gradient magnitude; borders mirror without repeating the edge
    /// pixel.
    pub fn sobel_magnitude(&self) -> GrayRaster {
        GrayRaster::from_fn(self.width, self.height, |x, y| {
            let (x, y) = (x as i64, y as i64);
            let p = |dx: i64, dy: i64| self.at_reflected(x + dx, y + dy);
            let gx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
            let gy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
            (gx * gx + gy * gy).sqrt()
        })
    }

    pub fn percentile(&self, p: f64) -> f64 {
        percentile(&self.data, p)
    }

    /// Divides every value by the raster's `p`-th percentile. Left unchanged
    /// when that percentile is not positive.
    pub fn normalized_by_percentile(&self, p: f64) -> GrayRaster {
        let scale = self.percentile(p);
        if scale <= 0.0 {
            return self.clone();
        }
        GrayRaster {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|v| v / scale).collect(),
        }
    }
}

fn reflect_101(i: i64, len: i64) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let mut i = i.rem_euclid(period);
    if i >= len {
        i = period - i;
    }
    i as usize
}

#[cfg(test)]
mod raster_tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_get_out_of_bounds_is_none() {
        let raster = GrayRaster::filled(4, 3, 1.0);
        assert_eq!(raster.get(0, 0), Some(1.0));
        assert_eq!(raster.get(3, 2), Some(1.0));
        assert_eq!(raster.get(-1, 0), None);
        assert_eq!(raster.get(4, 0), None);
        assert_eq!(raster.get(0, 3), None);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-3, 1), 0);
    }

    #[test]
    fn test_sobel_on_vertical_step() {
        let raster = GrayRaster::from_fn(8, 8, |x, _| if x < 4 { 0.0 } else { 10.0 });
        let grad = raster.sobel_magnitude();
        assert_relative_eq!(grad.get(3, 4).unwrap(), 40.0);
        assert_relative_eq!(grad.get(4, 4).unwrap(), 40.0);
        assert_relative_eq!(grad.get(1, 4).unwrap(), 0.0);
        assert_relative_eq!(grad.get(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_constant_raster_has_no_gradient() {
        let grad = GrayRaster::filled(5, 5, 7.0).sobel_magnitude();
        assert!(grad.values().iter().all(|&v| v == 0.0));
        assert_eq!(grad.normalized_by_percentile(99.0), grad);
    }

    #[test]
    fn test_from_luma_keeps_layout() {
        let img = GrayImage::from_fn(3, 2, |x, y| image::Luma([(x + 10 * y) as u8]));
        let raster = GrayRaster::from_luma(&img);
        assert_eq!(raster.get(2, 1), Some(12.0));
        assert_eq!(raster.get(1, 0), Some(1.0));
    }
}
