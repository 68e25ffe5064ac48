//! Convergence criteria for the optimizer.
//!
//! This module defines the criteria used to determine when an optimization
//! has converged to a solution, and the ways it can stop without one.

use ndarray::Array1;

use super::config::LmConfig;

/// Possible convergence states of the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The algorithm is still running.
    Running,

    /// Converged due to a small parameter change.
    ParameterConvergence,

    /// Converged due to a small change in the sum of squares.
    FunctionValueConvergence,

    /// Converged due to a small gradient.
    GradientConvergence,

    /// The residuals vanished.
    ZeroResidual,

    /// Stopped after the maximum number of iterations.
    MaxIterationsReached,

    /// No step reduced the sum of squares before lambda reached its maximum.
    LambdaLimitReached,

    /// The residuals could not be evaluated as finite numbers.
    NumericalError,
}

impl ConvergenceStatus {
    /// Returns true if the optimization has terminated (either converged or failed).
    pub fn is_terminated(&self) -> bool {
        !matches!(self, ConvergenceStatus::Running)
    }

    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::ParameterConvergence
                | ConvergenceStatus::FunctionValueConvergence
                | ConvergenceStatus::GradientConvergence
                | ConvergenceStatus::ZeroResidual
        )
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::Running => "Optimization is still running",
            ConvergenceStatus::ParameterConvergence => "Converged: small parameter change",
            ConvergenceStatus::FunctionValueConvergence => "Converged: small change in sum of squares",
            ConvergenceStatus::GradientConvergence => "Converged: small gradient",
            ConvergenceStatus::ZeroResidual => "Converged: residuals are zero",
            ConvergenceStatus::MaxIterationsReached => "Terminated: maximum iterations reached",
            ConvergenceStatus::LambdaLimitReached => {
                "Terminated: failed to decrease cost, and lambda reached maximum"
            }
            ConvergenceStatus::NumericalError => "Terminated: numerical error",
        }
    }
}

/// Criteria for determining when the optimizer has converged.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    /// Tolerance for change in parameter values.
    pub xtol: f64,

    /// Tolerance for change in function value.
    pub ftol: f64,

    /// Tolerance for gradient norm.
    pub gtol: f64,

    /// Maximum number of iterations.
    pub max_iterations: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self::from(&LmConfig::default())
    }
}

impl From<&LmConfig> for ConvergenceCriteria {
    fn from(config: &LmConfig) -> Self {
        Self {
            xtol: config.xtol,
            ftol: config.ftol,
            gtol: config.gtol,
            max_iterations: config.max_iterations,
        }
    }
}

impl ConvergenceCriteria {
    pub fn new(xtol: f64, ftol: f64, gtol: f64, max_iterations: usize) -> Self {
        Self {
            xtol,
            ftol,
            gtol,
            max_iterations,
        }
    }

    /// Status before a step is attempted.
    pub fn check_start(&self, cost: f64, gradient_norm: f64, iterations: usize) -> ConvergenceStatus {
        if !cost.is_finite() || !gradient_norm.is_finite() {
            return ConvergenceStatus::NumericalError;
        }
        if cost == 0.0 {
            return ConvergenceStatus::ZeroResidual;
        }
        if gradient_norm < self.gtol {
            return ConvergenceStatus::GradientConvergence;
        }
        if iterations >= self.max_iterations {
            return ConvergenceStatus::MaxIterationsReached;
        }
        ConvergenceStatus::Running
    }

    /// Status after an accepted step from `params` to `new_params`.
    pub fn check_step(
        &self,
        params: &Array1<f64>,
        new_params: &Array1<f64>,
        cost: f64,
        new_cost: f64,
    ) -> ConvergenceStatus {
        if new_cost == 0.0 {
            return ConvergenceStatus::ZeroResidual;
        }

        let param_change = new_params
            .iter()
            .zip(params.iter())
            .map(|(a, b)| (a - b).abs() / b.abs().max(1.0))
            .fold(0.0, f64::max);
        if param_change < self.xtol {
            return ConvergenceStatus::ParameterConvergence;
        }

        let cost_change = (cost - new_cost).abs() / cost.max(f64::MIN_POSITIVE);
        if cost_change < self.ftol {
            return ConvergenceStatus::FunctionValueConvergence;
        }

        ConvergenceStatus::Running
    }

    /// Status after a rejected step: converged when neither the parameters
    /// nor the linearized sum of squares can still change meaningfully.
    pub fn check_rejected(
        &self,
        params: &Array1<f64>,
        step: &Array1<f64>,
        cost: f64,
        predicted_reduction: f64,
    ) -> ConvergenceStatus {
        if predicted_reduction.abs() <= self.ftol * cost {
            return ConvergenceStatus::FunctionValueConvergence;
        }

        let step_size = step
            .iter()
            .zip(params.iter())
            .map(|(d, p)| d.abs() / p.abs().max(1.0))
            .fold(0.0, f64::max);
        if step_size < self.xtol {
            return ConvergenceStatus::ParameterConvergence;
        }

        ConvergenceStatus::Running
    }
}
