//! Configuration options for the Levenberg-Marquardt algorithm.
//!
//! This module defines the convergence criteria, damping schedule and
//! Jacobian settings of the optimizer.

use serde::{Deserialize, Serialize};

use crate::error::{DiffusionError, Result};

/// Method for solving the damped normal equations in each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecompositionMethod {
    /// Cholesky decomposition (fastest but requires positive definite matrix)
    Cholesky,

    /// QR decomposition (slower, tolerates an ill-conditioned matrix)
    QR,

    /// Cholesky, falling back to QR when the matrix is not positive definite
    #[default]
    Auto,
}

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Maximum number of iterations. Default: 200
    pub max_iterations: usize,

    /// Tolerance for relative change in the sum of squares. Default: 1e-10
    pub ftol: f64,

    /// Tolerance for relative change in parameter values. Default: 1e-10
    pub xtol: f64,

    /// Tolerance for gradient norm. Default: 1e-12
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e12
    pub max_lambda: f64,

    /// Method to use for solving the linear system. Default: Auto
    pub decomposition_method: DecompositionMethod,

    /// Relative step of the finite-difference Jacobian. Default: 1e-8
    pub fd_epsilon: Option<f64>,

    /// Evaluate finite-difference columns with Rayon (needs the `parallel`
    /// feature; ignored otherwise). Default: false
    pub parallel_jacobian: bool,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-12,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            decomposition_method: DecompositionMethod::default(),
            fd_epsilon: None,
            parallel_jacobian: false,
        }
    }
}

impl LmConfig {
    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.ftol = ftol;
        self
    }

    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.xtol = xtol;
        self
    }

    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.initial_lambda = lambda;
        self
    }

    pub fn with_lambda_factors(mut self, up: f64, down: f64) -> Self {
        self.lambda_up_factor = up;
        self.lambda_down_factor = down;
        self
    }

    pub fn with_decomposition_method(mut self, method: DecompositionMethod) -> Self {
        self.decomposition_method = method;
        self
    }

    pub fn with_fd_epsilon(mut self, epsilon: f64) -> Self {
        self.fd_epsilon = Some(epsilon);
        self
    }

    pub fn with_parallel_jacobian(mut self, parallel: bool) -> Self {
        self.parallel_jacobian = parallel;
        self
    }

    /// Reject damping schedules under which a rejected step could be
    /// retried forever.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(DiffusionError::InvalidInput(message));

        if !(self.initial_lambda > 0.0 && self.initial_lambda.is_finite()) {
            return invalid(format!("initial_lambda must be positive, got {}", self.initial_lambda));
        }
        if !(self.lambda_up_factor > 1.0 && self.lambda_up_factor.is_finite()) {
            return invalid(format!("lambda_up_factor must exceed 1, got {}", self.lambda_up_factor));
        }
        if !(self.lambda_down_factor > 0.0 && self.lambda_down_factor <= 1.0) {
            return invalid(format!(
                "lambda_down_factor must lie in (0, 1], got {}",
                self.lambda_down_factor
            ));
        }
        if !(self.min_lambda >= 0.0 && self.min_lambda <= self.initial_lambda) {
            return invalid(format!(
                "min_lambda must lie in [0, initial_lambda], got {}",
                self.min_lambda
            ));
        }
        if !(self.max_lambda > self.initial_lambda) {
            return invalid(format!(
                "max_lambda ({}) must exceed initial_lambda ({})",
                self.max_lambda, self.initial_lambda
            ));
        }
        if let Some(epsilon) = self.fd_epsilon {
            if !(epsilon > 0.0 && epsilon.is_finite()) {
                return invalid(format!("fd_epsilon must be positive, got {epsilon}"));
            }
        }
        Ok(())
    }
}
