//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core iteration: evaluate the Jacobian, solve
//! the damped normal equations, accept the step if it lowers the sum of
//! squares and relax the damping, otherwise raise the damping and retry.

use log::debug;
use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{DiffusionError, Result};
use crate::problem::Problem;
use crate::utils::finite_difference;

use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Jacobian at the solution
    pub jacobian: Array2<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted steps
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization converged
    pub success: bool,

    /// Why the iteration stopped
    pub status: ConvergenceStatus,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Optimizer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Minimize the sum of squared residuals of `problem` from `initial_params`.
    ///
    /// Running out of iterations or damping is reported through
    /// [`LmResult::success`]; errors are reserved for an invalid
    /// configuration and problems that cannot be evaluated at the starting
    /// point.
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        self.config.validate()?;
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(DiffusionError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let criteria = ConvergenceCriteria::from(&self.config);
        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut cost = sum_of_squares(&residuals);
        let mut func_evals = 1;
        let mut lambda = self.config.initial_lambda;
        let mut iterations = 0;

        let (status, jacobian) = 'outer: loop {
            let jacobian = self.jacobian(problem, &params)?;
            func_evals += n_params;

            let jtj = jacobian.t().dot(&jacobian);
            let jtr = jacobian.t().dot(&residuals);
            let gradient_norm = jtr.dot(&jtr).sqrt();

            let status = criteria.check_start(cost, gradient_norm, iterations);
            if status.is_terminated() {
                break (status, jacobian);
            }

            loop {
                let step = match LmStep::calculate_step(&jtj, &jtr, lambda, self.config.decomposition_method) {
                    Some(step) => step,
                    None => {
                        lambda *= self.config.lambda_up_factor;
                        if lambda >= self.config.max_lambda {
                            break 'outer (ConvergenceStatus::LambdaLimitReached, jacobian);
                        }
                        continue;
                    }
                };

                let new_params = &params + &step.step;
                let trial = match problem.eval(&new_params) {
                    Ok(r) => Some(r),
                    // A trial point outside the model's domain counts as a rejected step
                    Err(DiffusionError::NumericalDegeneracy(message)) => {
                        debug!("lm: rejected step, {}", message);
                        None
                    }
                    Err(e) => return Err(e),
                };
                func_evals += 1;

                let accepted = trial.and_then(|new_residuals| {
                    let new_cost = sum_of_squares(&new_residuals);
                    (new_cost.is_finite() && new_cost < cost).then_some((new_residuals, new_cost))
                });

                match accepted {
                    Some((new_residuals, new_cost)) => {
                        let status = criteria.check_step(&params, &new_params, cost, new_cost);
                        debug!(
                            "lm: iteration {} cost {:.6e} -> {:.6e} (predicted {:.3e}), lambda {:.1e}",
                            iterations + 1,
                            cost,
                            new_cost,
                            step.predicted_reduction,
                            lambda
                        );

                        params = new_params;
                        residuals = new_residuals;
                        cost = new_cost;
                        iterations += 1;
                        lambda = (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);

                        if status.is_terminated() {
                            let jacobian = self.jacobian(problem, &params)?;
                            func_evals += n_params;
                            break 'outer (status, jacobian);
                        }
                        break;
                    }
                    None => {
                        let status = criteria.check_rejected(&params, &step.step, cost, step.predicted_reduction);
                        if status.is_terminated() {
                            break 'outer (status, jacobian);
                        }
                        lambda *= self.config.lambda_up_factor;
                        if lambda >= self.config.max_lambda {
                            break 'outer (ConvergenceStatus::LambdaLimitReached, jacobian);
                        }
                    }
                }
            }
        };

        let success = status.is_converged();
        let message = match status {
            ConvergenceStatus::MaxIterationsReached => format!(
                "Maximum iterations ({}) reached",
                self.config.max_iterations
            ),
            _ => status.description().to_string(),
        };
        debug!("lm: {} after {} iterations, cost {:.6e}", message, iterations, cost);

        Ok(LmResult {
            params,
            residuals,
            jacobian,
            cost,
            iterations,
            func_evals,
            success,
            status,
            message,
        })
    }

    fn jacobian<P: Problem>(&self, problem: &P, params: &Array1<f64>) -> Result<Array2<f64>> {
        if problem.has_custom_jacobian() {
            return problem.jacobian(params);
        }

        #[cfg(feature = "parallel")]
        {
            if self.config.parallel_jacobian {
                return crate::utils::parallel::jacobian_parallel(problem, params, self.config.fd_epsilon);
            }
        }

        finite_difference::jacobian(problem, params, self.config.fd_epsilon)
    }
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}
