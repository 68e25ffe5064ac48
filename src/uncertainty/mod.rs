//! # Uncertainty Calculation
//!
//! Standard errors of fitted parameters from the Jacobian at the solution,
//! the way lmfit-py reports them: the covariance is `inv(JᵀJ)` scaled by the
//! reduced chi-square, and standard errors are the square roots of its
//! diagonal.

mod covariance;

pub use covariance::{calculate_correlation, calculate_covariance, standard_errors_from_covariance};

use ndarray::Array2;

use crate::error::Result;

/// Calculator for parameter uncertainties.
#[derive(Debug, Clone)]
pub struct UncertaintyCalculator {
    /// Degrees of freedom (n_points - n_parameters)
    pub nfree: usize,
    /// Chi-square value at minimum
    pub chisqr: f64,
    /// Reduced chi-square (chi^2 / nfree)
    pub redchi: f64,
}

impl UncertaintyCalculator {
    /// Returns `None` when there are no more residuals than free parameters:
    /// the reduced chi-square, and with it every error estimate, is undefined.
    pub fn new(ndata: usize, nvarys: usize, chisqr: f64) -> Option<Self> {
        if ndata <= nvarys {
            return None;
        }
        let nfree = ndata - nvarys;
        Some(Self {
            nfree,
            chisqr,
            redchi: chisqr / nfree as f64,
        })
    }

    /// Calculate the covariance matrix from the Jacobian
    pub fn calculate_covariance(&self, jacobian: &Array2<f64>) -> Result<Array2<f64>> {
        covariance::calculate_covariance(jacobian, self.redchi)
    }

}
