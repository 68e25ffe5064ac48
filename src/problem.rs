//! Problem definition trait.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem to be solved with the Levenberg-Marquardt algorithm.
//! The fit adapter in [`crate::fit`] implements it for the diffusion models.

use ndarray::{Array1, Array2};

use crate::error::Result;

/// A nonlinear least squares problem over a flat parameter vector.
///
/// Problems must be `Sync` so Jacobian columns can be evaluated from
/// several threads.
pub trait Problem: Sync {
    /// Evaluate the residuals at the given parameters.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix at the given parameters.
    ///
    /// The default implementation uses forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Whether `jacobian` is overridden with an analytical form. The
    /// optimizer only substitutes its parallel finite-difference Jacobian
    /// when this is false.
    fn has_custom_jacobian(&self) -> bool {
        false
    }

    /// Sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}
