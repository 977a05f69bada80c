//! Integration tests for the Levenberg-Marquardt solver.

use approx::assert_relative_eq;
use dryfit::lm::{ConvergenceStatus, LevenbergMarquardt, LmConfig};
use dryfit::{DryFitError, Problem, Result};
use ndarray::{array, Array1, Array2};

/// f(x) = a*x + b
struct LinearProblem {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl LinearProblem {
    fn new(x_data: Array1<f64>, y_data: Array1<f64>) -> Self {
        assert_eq!(x_data.len(), y_data.len(), "Data dimensions must match");
        Self { x_data, y_data }
    }
}

impl Problem for LinearProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != 2 {
            return Err(DryFitError::DimensionMismatch(format!(
                "Expected 2 parameters, got {}",
                params.len()
            )));
        }

        let (a, b) = (params[0], params[1]);
        Ok(&self.x_data.mapv(|x| a * x + b) - &self.y_data)
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }

    fn jacobian(&self, _params: &Array1<f64>) -> Result<Array2<f64>> {
        let n = self.x_data.len();
        let mut jac = Array2::zeros((n, 2));
        for i in 0..n {
            jac[[i, 0]] = self.x_data[i];
            jac[[i, 1]] = 1.0;
        }
        Ok(jac)
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}

/// (1-x)² + 100(y-x²)² as two residuals
struct RosenbrockProblem;

impl Problem for RosenbrockProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (x, y) = (params[0], params[1]);
        Ok(array![1.0 - x, 10.0 * (y - x.powi(2))])
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        2
    }

    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        let x = params[0];
        Ok(array![[-1.0, 0.0], [-20.0 * x, 10.0]])
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}

/// a * exp(-b x), Jacobian by finite differences
struct ExponentialProblem {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl Problem for ExponentialProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (a, b) = (params[0], params[1]);
        Ok(&self.x_data.mapv(|x| a * (-b * x).exp()) - &self.y_data)
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }
}

#[test]
fn test_linear_fitting() {
    // y = 3x + 2 + noise
    let x = array![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let y = array![2.1, 4.9, 8.05, 10.8, 14.1, 17.0];
    let problem = LinearProblem::new(x, y);

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![1.0, 1.0])
        .unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.params[0], 3.0, epsilon = 0.1);
    assert_relative_eq!(result.params[1], 2.0, epsilon = 0.1);
    assert!(result.cost < 0.1);
}

#[test]
fn test_rosenbrock_optimization() {
    let config = LmConfig {
        max_iterations: Some(200),
        ftol: 1e-10,
        xtol: 1e-10,
        gtol: 1e-10,
        ..LmConfig::default()
    };

    // Classic start far from the minimum at (1, 1)
    let result = LevenbergMarquardt::with_config(config)
        .minimize(&RosenbrockProblem, array![-1.2, 1.0])
        .unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.params[0], 1.0, epsilon = 1e-4);
    assert_relative_eq!(result.params[1], 1.0, epsilon = 1e-4);
    assert!(result.cost < 1e-8);
}

#[test]
fn test_exponential_fitting_with_finite_differences() {
    // y = 2 * exp(-0.5 * x) + noise
    let problem = ExponentialProblem {
        x_data: array![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0],
        y_data: array![2.02, 1.67, 1.21, 0.98, 0.81, 0.62, 0.45, 0.39, 0.29],
    };

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![1.0, 0.1])
        .unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 0.1);
    assert_relative_eq!(result.params[1], 0.5, epsilon = 0.1);
    assert!(result.cost < 0.02);
}

#[test]
fn test_bad_initial_guess() {
    let x = array![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let y = x.mapv(|x| 3.0 * x + 2.0);
    let problem = LinearProblem::new(x, y);

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![100.0, -50.0])
        .unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.params[0], 3.0, epsilon = 1e-6);
    assert_relative_eq!(result.params[1], 2.0, epsilon = 1e-6);
}

#[test]
fn test_custom_config() {
    // y = 2x + 1
    let problem = LinearProblem::new(
        array![0.0, 1.0, 2.0, 3.0, 4.0],
        array![1.0, 3.0, 5.0, 7.0, 9.0],
    );

    let config = LmConfig {
        max_iterations: Some(5),
        ftol: 1e-2,
        xtol: 1e-2,
        gtol: 1e-2,
        step_bound: 1.0,
        ..LmConfig::default()
    };

    let result = LevenbergMarquardt::with_config(config)
        .minimize(&problem, array![1.0, 0.0])
        .unwrap();

    assert!(result.success, "{}", result);
    assert!(result.iterations <= 5);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 0.2);
    assert_relative_eq!(result.params[1], 1.0, epsilon = 0.2);
}

#[test]
fn test_iteration_cap_is_reported_not_raised() {
    let config = LmConfig {
        max_iterations: Some(1),
        ..LmConfig::default()
    };

    let result = LevenbergMarquardt::with_config(config)
        .minimize(&RosenbrockProblem, array![-1.2, 1.0])
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.status, ConvergenceStatus::MaxIterationsReached);
    // One trial step after the initial evaluation
    assert_eq!(result.func_evals, 2);
    assert!(result.iterations <= 1);
}

#[test]
fn test_underdetermined_problem_is_rejected() {
    let problem = LinearProblem::new(array![1.0], array![2.0]);
    let err = LevenbergMarquardt::new()
        .minimize(&problem, array![0.0, 0.0])
        .unwrap_err();
    assert!(matches!(err, DryFitError::InsufficientData(_)));
}
