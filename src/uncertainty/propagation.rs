//! Closed-form error propagation for a weighted sum of child values.
//!
//! For `S = Σ w_i X_i` with independent `X_i`, `Var(S) = Σ w_i² Var(X_i)`.
//! This is first-order propagation, not resampling; its result type is kept
//! separate from [`crate::domain::UncertaintyBounds`] so the two are never
//! mistaken for one another.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationMethod {
    ErrorPropagation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropagatedError {
    pub method: PropagationMethod,
    pub variance: f64,
    /// `sqrt(variance)`.
    pub standard_error: f64,
    pub n_components: usize,
}

/// Propagate child variances through harmonization weights.
///
/// `weights[i]` pairs with `child_variances[i]`; unequal lengths are an error.
/// Negative or non-finite variances are rejected as invalid input.
pub fn propagate_harmonization_error(weights: &[f64], child_variances: &[f64]) -> Result<PropagatedError, AppError> {
    if weights.len() != child_variances.len() {
        return Err(AppError::length_mismatch(
            "propagate_harmonization_error",
            weights.len(),
            child_variances.len(),
        ));
    }
    if let Some(v) = child_variances.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(AppError::invalid_input(format!("Child variance must be a non-negative number, got {v}.")));
    }

    let variance: f64 = weights
        .iter()
        .zip(child_variances)
        .map(|(w, var)| w * w * var)
        .sum();

    Ok(PropagatedError {
        method: PropagationMethod::ErrorPropagation,
        variance,
        standard_error: variance.sqrt(),
        n_components: weights.len(),
    })
}
