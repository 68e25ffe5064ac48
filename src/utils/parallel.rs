//! Parallel Jacobian evaluation.
//!
//! Each Jacobian column of a whole-block problem re-evaluates a full 3D
//! field, so the columns are computed with Rayon when the `parallel`
//! feature is enabled.

use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::error::Result;
use crate::problem::Problem;
use crate::utils::finite_difference::{check_residual_count, step_size, DEFAULT_EPSILON};

/// Compute the Jacobian matrix using forward finite differences in parallel.
///
/// Same values as [`crate::utils::finite_difference::jacobian`]; only the
/// column evaluations run concurrently.
pub fn jacobian_parallel(problem: &dyn Problem, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let residuals = problem.eval(params)?;
    check_residual_count(problem, &residuals)?;

    let columns: Result<Vec<Array1<f64>>> = (0..params.len())
        .into_par_iter()
        .map(|j| {
            let eps_j = step_size(params[j], eps);
            let mut params_perturbed = params.clone();
            params_perturbed[j] += eps_j;

            let residuals_perturbed = problem.eval(&params_perturbed)?;
            check_residual_count(problem, &residuals_perturbed)?;
            Ok((&residuals_perturbed - &residuals) / eps_j)
        })
        .collect();

    let mut jac = Array2::zeros((residuals.len(), params.len()));
    for (j, column) in columns?.into_iter().enumerate() {
        jac.column_mut(j).assign(&column);
    }
    Ok(jac)
}
