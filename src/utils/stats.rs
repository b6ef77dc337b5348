/// Percentile with linear interpolation between closest ranks, `p` in [0, 100].
/// Returns 0.0 for an empty slice; non-finite values are skipped.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Pearson correlation coefficient. `None` when either side has no spread
/// or the inputs are shorter than two samples.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (ma, mb) = (mean(a), mean(b));

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - ma;
        let dy = y - mb;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a <= f64::EPSILON || var_b <= f64::EPSILON {
        return None;
    }
    Some((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}

/// Centered moving average over a closed sequence. `window` is forced odd.
pub fn circular_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 || window <= 1 {
        return values.to_vec();
    }
    let half = (window | 1) / 2;
    let width = (2 * half + 1) as f64;

    (0..n)
        .map(|i| {
            let sum: f64 = (-(half as isize)..=half as isize)
                .map(|k| values[(i as isize + k).rem_euclid(n as isize) as usize])
                .sum();
            sum / width
        })
        .collect()
}

#[cfg(test)]
mod stats_tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_percentile_interpolates_like_linear_rank() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_relative_eq!(percentile(&values, 0.0), 1.0);
        assert_relative_eq!(percentile(&values, 50.0), 3.0);
        assert_relative_eq!(percentile(&values, 100.0), 5.0);
        assert_relative_eq!(percentile(&values, 10.0), 1.4, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_empty_and_nan() {
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_relative_eq!(percentile(&[f64::NAN, 2.0], 50.0), 2.0);
    }

    #[test]
    fn test_pearson_identical_and_flat() {
        let a = [1.0, 2.0, 3.0, 5.0];
        assert_relative_eq!(pearson(&a, &a).unwrap(), 1.0, epsilon = 1e-12);
        let neg: Vec<f64> = a.iter().map(|v| -v).collect();
        assert_relative_eq!(pearson(&a, &neg).unwrap(), -1.0, epsilon = 1e-12);
        assert!(pearson(&a, &[2.0, 2.0, 2.0, 2.0]).is_none());
    }

    #[test]
    fn test_circular_moving_average_wraps() {
        let values = [3.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let smoothed = circular_moving_average(&values, 3);
        assert_relative_eq!(smoothed[0], 1.0);
        assert_relative_eq!(smoothed[1], 1.0);
        assert_relative_eq!(smoothed[5], 1.0);
        assert_relative_eq!(smoothed[3], 0.0);
        assert_relative_eq!(smoothed.iter().sum::<f64>(), 3.0, epsilon = 1e-12);
    }
}
