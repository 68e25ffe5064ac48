//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! The step solves the damped normal equations with Marquardt scaling,
//!
//! ```text
//! (JᵀJ + λ diag(JᵀJ)) δ = -Jᵀr
//! ```
//!
//! which moves from Gauss-Newton (small λ) towards scaled gradient descent
//! (large λ).

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

use super::config::DecompositionMethod;
use crate::utils::matrix_convert::{nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra};

/// Floor on the diagonal scaling, so a parameter the residuals ignore
/// still gets damped.
const MIN_DIAGONAL: f64 = 1e-10;

/// Result of a Levenberg-Marquardt step calculation.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The calculated step vector
    pub step: Array1<f64>,

    /// Reduction of the sum of squares predicted by the linearized model
    pub predicted_reduction: f64,

    /// The damping parameter used to calculate the step
    pub lambda: f64,
}

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Step for normal matrix `jtj = JᵀJ` and gradient `jtr = Jᵀr`.
    ///
    /// Returns `None` when the damped system cannot be solved.
    pub fn calculate_step(
        jtj: &Array2<f64>,
        jtr: &Array1<f64>,
        lambda: f64,
        method: DecompositionMethod,
    ) -> Option<StepResult> {
        let mut augmented = jtj.clone();
        for i in 0..augmented.nrows() {
            augmented[[i, i]] += lambda * jtj[[i, i]].max(MIN_DIAGONAL);
        }

        let a = ndarray_to_nalgebra(&augmented);
        let b = ndarray_vec_to_nalgebra(&jtr.mapv(|g| -g));

        let solution = match method {
            DecompositionMethod::Cholesky => a.cholesky().map(|c| c.solve(&b)),
            DecompositionMethod::QR => Self::solve_qr(a, &b),
            DecompositionMethod::Auto => match a.clone().cholesky() {
                Some(c) => Some(c.solve(&b)),
                None => Self::solve_qr(a, &b),
            },
        }?;

        let step = nalgebra_vec_to_ndarray(&solution);
        if step.iter().any(|s| !s.is_finite()) {
            return None;
        }

        let predicted_reduction = Self::predicted_reduction(jtj, jtr, &step);
        Some(StepResult {
            step,
            predicted_reduction,
            lambda,
        })
    }

    fn solve_qr(a: DMatrix<f64>, b: &nalgebra::DVector<f64>) -> Option<nalgebra::DVector<f64>> {
        a.qr().solve(b)
    }

    /// `-2 δᵀJᵀr - δᵀJᵀJδ`, the decrease of `Σr²` under the linear model.
    fn predicted_reduction(jtj: &Array2<f64>, jtr: &Array1<f64>, step: &Array1<f64>) -> f64 {
        -2.0 * step.dot(jtr) - step.dot(&jtj.dot(step))
    }
}
