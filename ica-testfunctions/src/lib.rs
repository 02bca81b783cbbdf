//! Benchmark objective functions for exercising the ICA optimizer end to end.
//!
//! Every function here is a pure, N-dimensional `Array1<f64> -> f64` map with a
//! known global minimum, matching the objective-adapter contract of `ica-core`.

use ndarray::Array1;

/// Sphere function. Global minimum `0.0` at the origin. Unimodal, separable.
pub fn sphere(x: &Array1<f64>) -> f64 {
    x.dot(x)
}

/// Rastrigin function. Global minimum `0.0` at the origin. Highly multimodal.
///
/// Bounds are typically `[-5.12, 5.12]` per dimension.
pub fn rastrigin(x: &Array1<f64>) -> f64 {
    let a = 10.0;
    a * x.len() as f64
        + x.iter()
            .map(|&xi| xi * xi - a * (2.0 * std::f64::consts::PI * xi).cos())
            .sum::<f64>()
}

/// Rosenbrock function ("banana" valley). Global minimum `0.0` at `(1, 1, ..., 1)`.
///
/// Bounds are typically `[-5.0, 10.0]` per dimension.
pub fn rosenbrock(x: &Array1<f64>) -> f64 {
    x.windows(2)
        .into_iter()
        .map(|pair| {
            let (xi, xi1) = (pair[0], pair[1]);
            100.0 * (xi1 - xi * xi).powi(2) + (1.0 - xi).powi(2)
        })
        .sum()
}

/// Returns the conventional `(lower, upper)` bound pair for a named benchmark function,
/// or `None` for an unrecognized name.
pub fn default_bounds(name: &str) -> Option<(f64, f64)> {
    match name {
        "sphere" => Some((-5.0, 5.0)),
        "rastrigin" => Some((-5.12, 5.12)),
        "rosenbrock" => Some((-5.0, 10.0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_minimum_is_zero_at_origin() {
        let x = Array1::from_vec(vec![0.0, 0.0, 0.0]);
        assert_eq!(sphere(&x), 0.0);
    }

    #[test]
    fn rastrigin_minimum_is_zero_at_origin() {
        let x = Array1::from_vec(vec![0.0, 0.0]);
        assert!(rastrigin(&x).abs() < 1e-12);
    }

    #[test]
    fn rosenbrock_minimum_is_zero_at_ones() {
        let x = Array1::from_vec(vec![1.0, 1.0, 1.0]);
        assert!(rosenbrock(&x).abs() < 1e-12);
    }

    #[test]
    fn rosenbrock_penalizes_off_valley_points() {
        let x = Array1::from_vec(vec![0.0, 0.0]);
        assert!(rosenbrock(&x) > 0.0);
    }
}
