//! # Covariance Matrix Calculations
//!
//! This module provides functions for calculating and manipulating covariance
//! matrices from Jacobian matrices in nonlinear least-squares optimization.

use ndarray::{Array1, Array2};

use crate::error::{DiffusionError, Result};
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};

/// Calculate covariance matrix from Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * inv(J^T * J)
/// where:
///   - J is the Jacobian matrix
///   - redchi is the reduced chi-square (chi^2 / dof)
///
/// A `J^T J` that cannot be inverted is reported as
/// [`DiffusionError::SingularMatrix`].
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let jtj = jacobian.t().dot(jacobian);
    let inverse = ndarray_to_nalgebra(&jtj).try_inverse().ok_or_else(|| {
        DiffusionError::SingularMatrix(format!(
            "J^T J ({}x{}) is not invertible; a free parameter does not affect the residuals",
            jtj.nrows(),
            jtj.ncols()
        ))
    })?;

    let covar = nalgebra_to_ndarray(&inverse) * redchi;
    if covar.iter().any(|c| !c.is_finite()) {
        return Err(DiffusionError::SingularMatrix(
            "covariance matrix has non-finite entries".to_string(),
        ));
    }
    Ok(covar)
}

/// Calculate correlation matrix from covariance matrix.
///
/// The correlation matrix is calculated as:
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            return 1.0;
        }
        let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
        if denom > 0.0 {
            covar[[i, j]] / denom
        } else {
            0.0
        }
    })
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements
/// of the covariance matrix.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar.diag().mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}
