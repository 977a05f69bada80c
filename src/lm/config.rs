//! Configuration options for the Levenberg-Marquardt algorithm.
//!
//! This module defines the configuration options and parameter settings for the
//! Levenberg-Marquardt algorithm: convergence tolerances, the initial step
//! bound, Jacobian source and linear solve method.

/// Method for calculating the Jacobian matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffMethod {
    /// Use whatever `Problem::jacobian` provides (analytic when the problem
    /// overrides it, forward differences otherwise)
    #[default]
    Analytical,

    /// Always approximate the Jacobian with forward differences
    FiniteDifference,
}

/// Method for solving the damped normal equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompositionMethod {
    /// Use Cholesky decomposition (fastest but requires positive definite matrix)
    Cholesky,

    /// Use SVD decomposition (slowest, handles rank-deficient matrices)
    SVD,

    /// Try Cholesky first and fall back to SVD
    #[default]
    Auto,
}

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone)]
pub struct LmConfig {
    /// Maximum number of trial steps, each costing one residual evaluation.
    /// Default: `None`, meaning `200 * (n + 1)` for a problem with `n` parameters
    pub max_iterations: Option<usize>,

    /// Tolerance for the actual and predicted relative reduction of the cost.
    /// Default: 1.49012e-8
    pub ftol: f64,

    /// Tolerance for the trust region radius relative to the scaled parameter
    /// norm. Default: 1.49012e-8
    pub xtol: f64,

    /// Tolerance for the cosine between the residuals and any Jacobian column.
    /// Default: 0.0
    pub gtol: f64,

    /// Initial trust region radius as a multiple of the scaled parameter norm.
    /// Default: 100.0
    pub step_bound: f64,

    /// Method to use for calculating the Jacobian. Default: Analytical
    pub diff_method: DiffMethod,

    /// Method to use for solving the linear system. Default: Auto
    pub decomposition_method: DecompositionMethod,

    /// Whether to calculate and return the Jacobian at the solution. Default: false
    pub calc_jacobian: bool,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 0.0,
            step_bound: 100.0,
            diff_method: DiffMethod::default(),
            decomposition_method: DecompositionMethod::default(),
            calc_jacobian: false,
        }
    }
}

impl LmConfig {
    /// Trial step cap for a problem with `n_params` free parameters.
    pub fn iteration_limit(&self, n_params: usize) -> usize {
        self.max_iterations.unwrap_or(200 * (n_params + 1))
    }
}
