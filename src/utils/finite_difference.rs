//! Finite difference methods for numerical differentiation.
//!
//! The diffusion models have no closed-form derivatives with respect to the
//! log10 diffusivities, so the optimizer works with forward differences.

use crate::error::{DiffusionError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default step size for finite differences.
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Step for parameter `value`: relative to its magnitude, absolute near zero.
pub(crate) fn step_size(value: f64, eps: f64) -> f64 {
    if value.abs() > eps {
        value.abs() * eps
    } else {
        eps
    }
}

pub(crate) fn check_residual_count(problem: &dyn Problem, residuals: &Array1<f64>) -> Result<()> {
    if residuals.len() != problem.residual_count() {
        return Err(DiffusionError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            problem.residual_count(),
            residuals.len()
        )));
    }
    Ok(())
}

/// Compute the Jacobian matrix using forward finite differences.
///
/// `J[i, j] = ∂residual[i] / ∂param[j]`, one extra evaluation per parameter.
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The relative step size (defaults to [`DEFAULT_EPSILON`])
pub fn jacobian(problem: &dyn Problem, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let residuals = problem.eval(params)?;
    check_residual_count(problem, &residuals)?;

    let mut jac = Array2::zeros((residuals.len(), params.len()));
    for j in 0..params.len() {
        let eps_j = step_size(params[j], eps);
        let mut params_perturbed = params.clone();
        params_perturbed[j] += eps_j;

        let residuals_perturbed = problem.eval(&params_perturbed)?;
        check_residual_count(problem, &residuals_perturbed)?;

        let column = (&residuals_perturbed - &residuals) / eps_j;
        jac.column_mut(j).assign(&column);
    }

    Ok(jac)
}
