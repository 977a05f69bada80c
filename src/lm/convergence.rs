//! Convergence criteria for the Levenberg-Marquardt iteration.
//!
//! This module defines the criteria used to determine when the optimization
//! has converged to a solution. The cost and parameter tests look at the
//! reductions of a trial step and at the trust region radius, so a step that
//! was only short because the region had collapsed does not count as
//! convergence unless the linearized model also predicts no further progress.

use ndarray::{Array1, Array2, Axis};

use super::trust_region::Reduction;

/// Possible convergence states for an optimization algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The algorithm is still running.
    Running,

    /// The algorithm has converged due to a small trust region relative to the parameters.
    ParameterConvergence,

    /// The algorithm has converged due to a small function value change.
    FunctionValueConvergence,

    /// The algorithm has converged due to a small gradient.
    GradientConvergence,

    /// The algorithm has terminated due to reaching the maximum number of iterations.
    MaxIterationsReached,

    /// The tolerances are below machine precision and no further progress is possible.
    ToleranceTooSmall,
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
        )
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> String {
        match self {
            ConvergenceStatus::Running => "Optimization is still running".to_string(),
            ConvergenceStatus::ParameterConvergence => {
                "Converged: small parameter change".to_string()
            }
            ConvergenceStatus::FunctionValueConvergence => {
                "Converged: small function value change".to_string()
            }
            ConvergenceStatus::GradientConvergence => "Converged: small gradient".to_string(),
            ConvergenceStatus::MaxIterationsReached => {
                "Terminated: maximum iterations reached".to_string()
            }
            ConvergenceStatus::ToleranceTooSmall => {
                "Terminated: no further reduction in the cost is possible".to_string()
            }
        }
    }
}

/// Criteria for determining when the optimization has converged.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    /// Tolerance for the trust region radius relative to the scaled parameters.
    pub xtol: f64,

    /// Tolerance for the relative reduction of the cost.
    pub ftol: f64,

    /// Tolerance for the scaled gradient.
    pub gtol: f64,

    /// Maximum number of trial steps.
    pub max_iterations: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            xtol: 1.49012e-8,
            ftol: 1.49012e-8,
            gtol: 0.0,
            max_iterations: 800,
        }
    }
}

impl ConvergenceCriteria {
    /// Creates a new set of convergence criteria with the given tolerances.
    pub fn new(xtol: f64, ftol: f64, gtol: f64, max_iterations: usize) -> Self {
        Self {
            xtol,
            ftol,
            gtol,
            max_iterations,
        }
    }

    /// Checks the scaled gradient at the current point.
    pub fn check_gradient(&self, gradient_norm: f64) -> ConvergenceStatus {
        if gradient_norm <= self.gtol {
            ConvergenceStatus::GradientConvergence
        } else {
            ConvergenceStatus::Running
        }
    }

    /// Checks whether a trial step ends the optimization.
    ///
    /// # Arguments
    ///
    /// * `reduction` - Actual and predicted reductions of the trial step
    /// * `delta` - The trust region radius after the step
    /// * `scaled_norm` - `‖D·x‖` at the current point
    /// * `gradient_norm` - The scaled gradient at the current point
    /// * `trials` - The number of trial steps taken so far
    pub fn check(
        &self,
        reduction: &Reduction,
        delta: f64,
        scaled_norm: f64,
        gradient_norm: f64,
        trials: usize,
    ) -> ConvergenceStatus {
        let ratio = reduction.ratio();
        let flat = |tol: f64| {
            reduction.actual.abs() <= tol && reduction.predicted <= tol && 0.5 * ratio <= 1.0
        };

        if flat(self.ftol) {
            return ConvergenceStatus::FunctionValueConvergence;
        }
        if delta <= self.xtol * scaled_norm {
            return ConvergenceStatus::ParameterConvergence;
        }
        if trials >= self.max_iterations {
            return ConvergenceStatus::MaxIterationsReached;
        }
        if flat(f64::EPSILON) || delta <= f64::EPSILON * scaled_norm || gradient_norm <= f64::EPSILON {
            return ConvergenceStatus::ToleranceTooSmall;
        }

        ConvergenceStatus::Running
    }
}

/// Euclidean norm of every Jacobian column.
pub fn column_norms(jacobian: &Array2<f64>) -> Array1<f64> {
    jacobian
        .axis_iter(Axis(1))
        .map(|column| column.dot(&column).sqrt())
        .collect()
}

/// Largest cosine between the residual vector and a Jacobian column.
///
/// Zero at an exact fit and for columns that are identically zero.
pub fn scaled_gradient_norm(gradient: &Array1<f64>, column_norms: &Array1<f64>, residual_norm: f64) -> f64 {
    if residual_norm == 0.0 {
        return 0.0;
    }

    gradient
        .iter()
        .zip(column_norms.iter())
        .filter(|(_, norm)| **norm != 0.0)
        .map(|(g, norm)| (g / residual_norm).abs() / norm)
        .fold(0.0, f64::max)
}
