//! Integration tests for the Problem trait and the minimizer behind the fits.

use approx::assert_relative_eq;
use hydiff_rs::fit::{ParameterProblem, Profile1dData};
use hydiff_rs::lm::{ConvergenceStatus, DecompositionMethod, LevenbergMarquardt, LmConfig};
use hydiff_rs::setup::{setup_1d, Profile1dSetup};
use hydiff_rs::utils::jacobian;
use hydiff_rs::{DiffusionError, Problem, Result};
use ndarray::{array, Array1, Array2};

use crate::test_helpers::synthetic_profile;

/// A simple linear model for testing: f(x) = a * x + b
struct LinearModel {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl LinearModel {
    /// Create a test problem with known solution: y = 2x + 3
    fn create_test_problem() -> Self {
        Self {
            x_data: array![1.0, 2.0, 3.0, 4.0, 5.0],
            y_data: array![5.0, 7.0, 9.0, 11.0, 13.0],
        }
    }
}

impl Problem for LinearModel {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != 2 {
            return Err(DiffusionError::DimensionMismatch(format!(
                "Expected 2 parameters, got {}",
                params.len()
            )));
        }
        Ok(self.x_data.mapv(|x| params[0] * x + params[1]) - &self.y_data)
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }
}

/// Same model with its analytical Jacobian
struct AnalyticLinearModel(LinearModel);

impl Problem for AnalyticLinearModel {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.0.eval(params)
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.0.residual_count()
    }

    fn jacobian(&self, _params: &Array1<f64>) -> Result<Array2<f64>> {
        let n = self.0.x_data.len();
        let mut jac = Array2::zeros((n, 2));
        for i in 0..n {
            jac[[i, 0]] = self.0.x_data[i];
            jac[[i, 1]] = 1.0;
        }
        Ok(jac)
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}

#[test]
fn test_finite_difference_matches_analytic() {
    let problem = AnalyticLinearModel(LinearModel::create_test_problem());
    let params = array![1.5, -0.5];

    let numeric = jacobian(&problem, &params, None).unwrap();
    let analytic = problem.jacobian(&params).unwrap();
    for (n, a) in numeric.iter().zip(analytic.iter()) {
        assert_relative_eq!(n, a, epsilon = 1e-6);
    }
    assert_relative_eq!(problem.eval_cost(&array![2.0, 3.0]).unwrap(), 0.0);
}

#[test]
fn test_minimizer_with_both_jacobians() {
    let numeric = LevenbergMarquardt::new()
        .minimize(&LinearModel::create_test_problem(), array![0.0, 0.0])
        .unwrap();
    let analytic = LevenbergMarquardt::new()
        .minimize(&AnalyticLinearModel(LinearModel::create_test_problem()), array![0.0, 0.0])
        .unwrap();

    for result in [numeric, analytic] {
        assert!(result.success, "{}", result);
        assert!(result.status.is_converged());
        assert_relative_eq!(result.params[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(result.params[1], 3.0, epsilon = 1e-6);
    }
}

#[test]
fn test_decompositions_agree() {
    let problem = LinearModel::create_test_problem();
    let fits: Vec<Array1<f64>> = [DecompositionMethod::Cholesky, DecompositionMethod::QR, DecompositionMethod::Auto]
        .into_iter()
        .map(|method| {
            let config = LmConfig::default().with_decomposition_method(method);
            LevenbergMarquardt::with_config(config)
                .minimize(&problem, array![10.0, -10.0])
                .unwrap()
                .params
        })
        .collect();

    for fit in &fits {
        assert_relative_eq!(fit[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(fit[1], 3.0, epsilon = 1e-6);
    }
}

#[test]
fn test_max_iterations_reported() {
    let config = LmConfig::default().with_max_iterations(0);
    let result = LevenbergMarquardt::with_config(config)
        .minimize(&LinearModel::create_test_problem(), array![0.0, 0.0])
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.status, ConvergenceStatus::MaxIterationsReached);
    assert_eq!(result.iterations, 0);
}

#[test]
fn test_parameter_problem_sees_only_free_parameters() {
    let data: Profile1dData = synthetic_profile(&Profile1dSetup::new(200.0, -13.0, 3600.0), 30, 0.0, 0);
    let template = Profile1dSetup::new(200.0, -13.0, 3600.0)
        .with_vary_initial(true)
        .build()
        .unwrap();
    let problem = ParameterProblem::new(&data, template);

    assert_eq!(problem.parameter_count(), 2);
    assert_eq!(problem.residual_count(), 30);

    let start = problem.initial_internal().unwrap();
    let residuals = problem.eval(&start).unwrap();
    assert!(residuals.iter().all(|r| r.abs() < 1e-12));

    let moved = problem.parameters_at(&array![-12.0, 1.0]).unwrap();
    assert_eq!(moved.value("log10_diffusivity").unwrap(), -12.0);
    assert_eq!(moved.value("length").unwrap(), setup_1d(200.0, -13.0, 3600.0).unwrap().value("length").unwrap());
}
