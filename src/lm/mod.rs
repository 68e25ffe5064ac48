//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides the nonlinear least-squares minimizer behind the
//! diffusivity fits. It works on any [`Problem`](crate::problem::Problem):
//! a flat parameter vector in, a residual vector out.

pub mod algorithm;
pub mod config;
pub mod convergence;
pub mod step;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::{DecompositionMethod, LmConfig};
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
pub use step::{LmStep, StepResult};
