//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core iteration for nonlinear least-squares
//! optimization: evaluate the Jacobian, solve the damped normal equations
//! inside the trust region, accept or reject the trial point, and resize the
//! region.

use ndarray::{Array1, Array2};
use std::fmt;
use tracing::{debug, trace};

use crate::error::{DryFitError, Result};
use crate::problem::Problem;
use crate::utils::finite_difference;

use super::config::{DiffMethod, LmConfig};
use super::convergence::{column_norms, scaled_gradient_norm, ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;
use super::trust_region::{Reduction, TrustRegion};

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted iterations
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization converged
    pub success: bool,

    /// How the optimization terminated
    pub status: ConvergenceStatus,

    /// A message describing the result
    pub message: String,

    /// The Jacobian matrix at the solution (if requested)
    pub jacobian: Option<Array2<f64>>,
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
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = Some(max_iterations);
        self
    }

    /// Set the tolerance for relative change in the cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial trust region radius, relative to the scaled parameters.
    pub fn with_step_bound(mut self, step_bound: f64) -> Self {
        self.config.step_bound = step_bound;
        self
    }

    /// Set the method used for calculating the Jacobian.
    pub fn with_differentiation_method(mut self, method: DiffMethod) -> Self {
        self.config.diff_method = method;
        self
    }

    /// Set whether to calculate and return the Jacobian at the solution.
    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.config.calc_jacobian = calc_jacobian;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Non-convergence (iteration cap, tolerances below machine precision) is
    /// reported through `LmResult::success`; errors are reserved for problems
    /// that cannot be evaluated at all.
    ///
    /// # Errors
    ///
    /// * `InsufficientData` when there are fewer residuals than parameters
    /// * `DimensionMismatch` when `initial_params` has the wrong length
    /// * `FunctionEvaluation` when the residuals are not finite at the initial guess
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(DryFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let n_residuals = problem.residual_count();
        if n_residuals < n_params {
            return Err(DryFitError::InsufficientData(format!(
                "{} data points cannot determine {} parameters",
                n_residuals, n_params
            )));
        }

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;

        if residuals.iter().any(|r| !r.is_finite()) {
            return Err(DryFitError::FunctionEvaluation(
                "residuals are not finite at the initial guess".to_string(),
            ));
        }

        let mut residual_norm = norm(&residuals);
        let mut iterations = 0;
        let mut trials = 0;
        let criteria = ConvergenceCriteria::new(
            self.config.xtol,
            self.config.ftol,
            self.config.gtol,
            self.config.iteration_limit(n_params),
        );

        // Set from the first Jacobian
        let mut scaling: Option<(Array1<f64>, TrustRegion)> = None;
        let mut scaled_norm = 0.0;

        debug!(
            n_params,
            n_residuals,
            cost = residual_norm.powi(2),
            "starting Levenberg-Marquardt"
        );

        let status = 'outer: loop {
            let jacobian = self.jacobian(problem, &params, &mut func_evals)?;
            let col_norms = column_norms(&jacobian);
            let gradient = jacobian.t().dot(&residuals);

            let (diag, trust_region) = scaling.get_or_insert_with(|| {
                let diag = col_norms.mapv(|c| if c == 0.0 { 1.0 } else { c });
                scaled_norm = norm(&(&diag * &params));
                let region = TrustRegion::new(self.config.step_bound, scaled_norm);
                (diag, region)
            });

            let gradient_norm = scaled_gradient_norm(&gradient, &col_norms, residual_norm);
            let status = criteria.check_gradient(gradient_norm);
            if status.is_terminated() {
                break status;
            }

            // Scale by the largest column norms seen so far
            diag.zip_mut_with(&col_norms, |d, c| *d = d.max(*c));
            let jtj = jacobian.t().dot(&jacobian);

            // Inner loop: shrink the region until a trial step lowers the cost
            loop {
                let step = LmStep::calculate_step(
                    &jtj,
                    &gradient,
                    diag,
                    trust_region.delta,
                    trust_region.par,
                    self.config.decomposition_method,
                )?;
                trust_region.par = step.par;
                if iterations == 0 {
                    trust_region.limit_to(step.scaled_norm);
                }

                let new_params = &params + &step.step;
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;
                trials += 1;

                let new_norm = norm(&new_residuals);
                let new_norm = if new_norm.is_finite() {
                    new_norm
                } else {
                    f64::INFINITY
                };

                let reduction = Reduction::new(
                    residual_norm,
                    new_norm,
                    norm(&jacobian.dot(&step.step)),
                    step.par,
                    step.scaled_norm,
                );
                let diverged = 0.1 * new_norm >= residual_norm;
                let accepted = trust_region.update(&reduction, step.scaled_norm, diverged);

                trace!(
                    iterations,
                    par = step.par,
                    delta = trust_region.delta,
                    cost = residual_norm.powi(2),
                    new_cost = new_norm.powi(2),
                    ratio = reduction.ratio(),
                    accepted,
                    "trial step"
                );

                if accepted {
                    params = new_params;
                    residuals = new_residuals;
                    residual_norm = new_norm;
                    scaled_norm = norm(&(&*diag * &params));
                    iterations += 1;
                }

                let status = criteria.check(
                    &reduction,
                    trust_region.delta,
                    scaled_norm,
                    gradient_norm,
                    trials,
                );
                if status.is_terminated() {
                    break 'outer status;
                }
                if accepted {
                    break;
                }
            }
        };

        let cost = residual_norm.powi(2);
        let success = status.is_converged();
        debug!(
            iterations,
            func_evals,
            cost,
            success,
            status = %status.description(),
            "Levenberg-Marquardt finished"
        );

        let jacobian = if self.config.calc_jacobian {
            Some(self.jacobian(problem, &params, &mut func_evals)?)
        } else {
            None
        };

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success,
            message: status.description(),
            status,
            jacobian,
        })
    }

    fn jacobian<P: Problem>(
        &self,
        problem: &P,
        params: &Array1<f64>,
        func_evals: &mut usize,
    ) -> Result<Array2<f64>> {
        let use_problem_jacobian =
            self.config.diff_method == DiffMethod::Analytical && problem.has_custom_jacobian();

        let jacobian = if use_problem_jacobian {
            problem.jacobian(params)?
        } else {
            *func_evals += params.len() + 1;
            finite_difference::jacobian(problem, params, None)?
        };

        let expected = (problem.residual_count(), problem.parameter_count());
        if jacobian.dim() != expected {
            return Err(DryFitError::DimensionMismatch(format!(
                "Expected a {}x{} Jacobian, got {:?}",
                expected.0,
                expected.1,
                jacobian.dim()
            )));
        }

        Ok(jacobian)
    }
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}
