//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! This module finds the step `δ` solving the damped normal equations
//!
//! ```text
//! (JᵀJ + par·D²) δ = -Jᵀr
//! ```
//!
//! with the damping `par` chosen so that the scaled step length `‖D·δ‖` lands
//! within 10% of the trust region radius `Δ`. When the Gauss-Newton step
//! (`par = 0`) already fits inside the region it is taken as is.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use super::config::DecompositionMethod;
use crate::error::{DryFitError, Result};
use crate::utils::{nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra};

/// Singular values below this fraction of the largest one are dropped by the SVD solve.
const SVD_RCOND: f64 = 1e-14;

/// Newton iterations allowed when searching for the damping parameter.
const MAX_DAMPING_ITERATIONS: usize = 10;

/// Result of a Levenberg-Marquardt step calculation.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The calculated step vector
    pub step: Array1<f64>,

    /// The damping parameter used to calculate the step
    pub par: f64,

    /// `‖D·δ‖`
    pub scaled_norm: f64,
}

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Calculates the Levenberg-Marquardt step for the region `‖D·δ‖ ≤ delta`.
    ///
    /// # Arguments
    ///
    /// * `jtj` - The `JᵀJ` matrix at the current position
    /// * `gradient` - The `Jᵀr` vector at the current position
    /// * `diag` - The scaling `D`, strictly positive
    /// * `delta` - The trust region radius
    /// * `par` - The damping parameter of the previous step
    /// * `method` - The decomposition used to solve the damped system
    pub fn calculate_step(
        jtj: &Array2<f64>,
        gradient: &Array1<f64>,
        diag: &Array1<f64>,
        delta: f64,
        par: f64,
        method: DecompositionMethod,
    ) -> Result<StepResult> {
        let n = jtj.nrows();
        if jtj.ncols() != n || gradient.len() != n || diag.len() != n {
            return Err(DryFitError::DimensionMismatch(format!(
                "JᵀJ is {}x{} but the gradient has {} entries and the scaling {}",
                jtj.nrows(),
                jtj.ncols(),
                gradient.len(),
                diag.len()
            )));
        }

        let system = DampedSystem::new(jtj, diag, method);
        let rhs = ndarray_vec_to_nalgebra(&gradient.mapv(|g| -g));

        let (mut step, full_rank) = system.solve(0.0, &rhs)?;
        let mut scaled_norm = system.scaled_norm(&step);
        let mut excess = scaled_norm - delta;
        if excess <= 0.1 * delta {
            return Self::finish(step, 0.0, scaled_norm);
        }

        // Bracket the damping: the lower bound is a Newton step from par = 0,
        // the upper bound makes the steepest descent step as long as delta
        let mut par_lower = if full_rank {
            Self::newton_correction(&system, 0.0, &step, scaled_norm, excess, delta)?
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let gradient_norm = gradient
            .iter()
            .zip(diag.iter())
            .map(|(g, d)| (g / d).powi(2))
            .sum::<f64>()
            .sqrt();
        let mut par_upper = gradient_norm / delta;
        if par_upper == 0.0 {
            par_upper = f64::MIN_POSITIVE / delta.min(0.1);
        }

        let mut par = par.max(par_lower).min(par_upper);
        if par == 0.0 {
            par = gradient_norm / scaled_norm;
        }

        for iteration in 1..=MAX_DAMPING_ITERATIONS {
            if par == 0.0 {
                par = f64::MIN_POSITIVE.max(0.001 * par_upper);
            }

            step = system.solve(par, &rhs)?.0;
            scaled_norm = system.scaled_norm(&step);
            let previous = excess;
            excess = scaled_norm - delta;

            if excess.abs() <= 0.1 * delta
                || (par_lower == 0.0 && excess <= previous && previous < 0.0)
                || iteration == MAX_DAMPING_ITERATIONS
            {
                break;
            }

            let Some(correction) =
                Self::newton_correction(&system, par, &step, scaled_norm, excess, delta)?
            else {
                break;
            };

            if excess > 0.0 {
                par_lower = par_lower.max(par);
            } else if excess < 0.0 {
                par_upper = par_upper.min(par);
            }
            par = par_lower.max(par + correction);
        }

        Self::finish(step, par, scaled_norm)
    }

    /// Newton correction to `par` for the equation `‖D·δ(par)‖ = delta`.
    fn newton_correction(
        system: &DampedSystem,
        par: f64,
        step: &DVector<f64>,
        scaled_norm: f64,
        excess: f64,
        delta: f64,
    ) -> Result<Option<f64>> {
        let direction =
            DVector::from_fn(step.len(), |i, _| system.diag[i].powi(2) * step[i] / scaled_norm);
        let curvature = direction.dot(&system.solve(par, &direction)?.0);

        if curvature > 0.0 && curvature.is_finite() {
            Ok(Some(excess / (delta * curvature)))
        } else {
            Ok(None)
        }
    }

    fn finish(step: DVector<f64>, par: f64, scaled_norm: f64) -> Result<StepResult> {
        let step = nalgebra_vec_to_ndarray(&step);
        if step.iter().any(|v| !v.is_finite()) {
            return Err(DryFitError::LinearAlgebraError(
                "step contains non-finite values".to_string(),
            ));
        }

        Ok(StepResult {
            step,
            par,
            scaled_norm,
        })
    }
}

/// `JᵀJ` and the scaling `D`, ready to be solved for any damping.
struct DampedSystem {
    jtj: DMatrix<f64>,
    diag: DVector<f64>,
    method: DecompositionMethod,
}

impl DampedSystem {
    fn new(jtj: &Array2<f64>, diag: &Array1<f64>, method: DecompositionMethod) -> Self {
        Self {
            jtj: ndarray_to_nalgebra(jtj),
            diag: ndarray_vec_to_nalgebra(diag),
            method,
        }
    }

    fn scaled_norm(&self, step: &DVector<f64>) -> f64 {
        self.diag.component_mul(step).norm()
    }

    /// Solves `(JᵀJ + par·D²) x = rhs`.
    ///
    /// The flag is `false` when the matrix was singular and the minimum norm
    /// solution was returned instead.
    fn solve(&self, par: f64, rhs: &DVector<f64>) -> Result<(DVector<f64>, bool)> {
        let mut a = self.jtj.clone();
        for i in 0..a.nrows() {
            a[(i, i)] += par * self.diag[i].powi(2);
        }

        match self.method {
            DecompositionMethod::Cholesky => a
                .cholesky()
                .map(|c| (c.solve(rhs), true))
                .ok_or_else(|| {
                    DryFitError::LinearAlgebraError(
                        "damped normal matrix is not positive definite".to_string(),
                    )
                }),
            DecompositionMethod::SVD => Self::solve_svd(a, rhs),
            DecompositionMethod::Auto => match a.clone().cholesky() {
                Some(c) => Ok((c.solve(rhs), true)),
                None => Self::solve_svd(a, rhs),
            },
        }
    }

    fn solve_svd(a: DMatrix<f64>, rhs: &DVector<f64>) -> Result<(DVector<f64>, bool)> {
        let n = a.nrows();
        let svd = a.svd(true, true);
        let eps = svd.singular_values.max() * SVD_RCOND;
        let full_rank = svd.rank(eps) == n;
        svd.solve(rhs, eps)
            .map(|x| (x, full_rank))
            .map_err(|e| DryFitError::LinearAlgebraError(format!("SVD solve failed: {e}")))
    }
}
