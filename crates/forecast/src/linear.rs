//! Ordinary least squares over positional indices.

use agri_core::TrendLine;

/// Fit `y ≈ slope * t + intercept` with `t = 0, 1, 2, ...`.
///
/// Returns `None` with fewer than two values.
pub fn fit_line(values: &[f64]) -> Option<TrendLine> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let mean_t = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;

    // Centered sums; the t-spread is never zero for n >= 2.
    let (s_ty, s_tt) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(s_ty, s_tt), (i, &y)| {
            let dt = i as f64 - mean_t;
            (s_ty + dt * (y - mean_y), s_tt + dt * dt)
        });

    let slope = s_ty / s_tt;
    Some(TrendLine {
        slope,
        intercept: mean_y - slope * mean_t,
        observations: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_line() {
        let line = fit_line(&[100.0, 102.0, 104.0, 106.0, 108.0]).unwrap();
        assert_eq!(line.slope, 2.0);
        assert_eq!(line.intercept, 100.0);
        assert_eq!(line.observations, 5);
    }

    #[test]
    fn test_two_points() {
        let line = fit_line(&[10.0, 7.0]).unwrap();
        assert_relative_eq!(line.slope, -3.0);
        assert_relative_eq!(line.intercept, 10.0);
    }

    #[test]
    fn test_flat_series() {
        let line = fit_line(&[5.0; 6]).unwrap();
        assert_relative_eq!(line.slope, 0.0);
        assert_relative_eq!(line.intercept, 5.0);
    }

    #[test]
    fn test_noisy_series_matches_normal_equations() {
        let data = [3.0, 5.0, 4.0, 8.0, 9.0, 8.5];
        let line = fit_line(&data).unwrap();

        let n = data.len() as f64;
        let sum_t: f64 = (0..data.len()).map(|i| i as f64).sum();
        let sum_y: f64 = data.iter().sum();
        let sum_t2: f64 = (0..data.len()).map(|i| (i * i) as f64).sum();
        let sum_ty: f64 = data.iter().enumerate().map(|(i, &y)| i as f64 * y).sum();
        let slope = (n * sum_ty - sum_t * sum_y) / (n * sum_t2 - sum_t * sum_t);
        let intercept = (sum_y - slope * sum_t) / n;

        assert_relative_eq!(line.slope, slope, epsilon = 1e-12);
        assert_relative_eq!(line.intercept, intercept, epsilon = 1e-12);
    }

    #[test]
    fn test_too_few_points() {
        assert!(fit_line(&[]).is_none());
        assert!(fit_line(&[42.0]).is_none());
    }
}
