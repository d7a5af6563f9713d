//! Least squares solver.
//!
//! Trend fitting repeatedly solves tiny regression problems of the form:
//!
//! ```text
//! minimize Σ (y_i - β0 - β1 x_i)^2
//! ```
//!
//! Implementation choices:
//! - We build the `[1, x - x̄]` design matrix and solve with SVD so that tall
//!   systems and near-collinear inputs are handled without panicking.
//!   (Nalgebra's `QR::solve` is intended for square systems.)
//! - Goodness-of-fit quantities are derived here so callers never recompute
//!   residual sums by hand.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Simple linear regression fit `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
    /// Residual sum of squares.
    pub sse: f64,
    /// Total sum of squares around the mean of `y`.
    pub sst: f64,
    /// Sum of squared x deviations (used for the slope standard error).
    pub sxx: f64,
    pub n: usize,
}

impl LineFit {
    /// Coefficient of determination, clamped to `[0, 1]`.
    ///
    /// A constant `y` has nothing to explain; we report `0` in that case.
    pub fn r_squared(&self) -> f64 {
        if self.sst <= f64::EPSILON * self.n as f64 {
            return 0.0;
        }
        (1.0 - self.sse / self.sst).clamp(0.0, 1.0)
    }

    /// Standard error of the slope estimate (`None` if undefined).
    pub fn slope_std_err(&self) -> Option<f64> {
        if self.n < 3 || self.sxx <= 0.0 {
            return None;
        }
        let dof = (self.n - 2) as f64;
        Some((self.sse / dof / self.sxx).sqrt())
    }
}

/// Fit a straight line through `(xs[i], ys[i])`.
///
/// Returns `None` for fewer than 2 points, non-finite input, or when all x values
/// coincide (slope is not identifiable). Callers are responsible for passing
/// equal-length slices.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<LineFit> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return None;
    }

    let x_mean = xs[..n].iter().sum::<f64>() / n as f64;
    let sxx: f64 = xs[..n].iter().map(|x| (x - x_mean).powi(2)).sum();
    if sxx <= 0.0 {
        return None;
    }

    // Centre x so calendar years do not blow up the condition number.
    let mut design = DMatrix::<f64>::zeros(n, 2);
    for (i, &x) in xs[..n].iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = x - x_mean;
    }
    let y = DVector::from_column_slice(&ys[..n]);

    let beta = solve_least_squares(&design, &y)?;
    let slope = beta[1];
    let intercept = beta[0] - slope * x_mean;

    let y_mean = ys[..n].iter().sum::<f64>() / n as f64;
    let mut sse = 0.0;
    let mut sst = 0.0;
    for i in 0..n {
        let fitted = intercept + slope * xs[i];
        sse += (ys[i] - fitted).powi(2);
        sst += (ys[i] - y_mean).powi(2);
    }

    Some(LineFit {
        intercept,
        slope,
        sse,
        sst,
        sxx,
        n,
    })
}
