//! Fitting a drying-curve model to measured samples.

use ndarray::{Array1, Array2};
use tracing::{debug, info};

use crate::error::{DryFitError, Result};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::model::CurveProblem;
use crate::models::DecayModel;
use crate::uncertainty::{covariance_from_fit, standard_errors_from_covariance};
use crate::utils::{ndarray_to_nalgebra, ndarray_vec_to_nalgebra};

/// Result of fitting a model to data
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Fitted parameter values, in the model's parameter order
    pub params: Array1<f64>,

    /// Parameter covariance, `+inf` everywhere when it cannot be estimated
    pub covariance: Array2<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted solver iterations
    pub iterations: usize,

    /// Number of residual evaluations
    pub func_evals: usize,

    /// How the solver terminated
    pub message: String,
}

impl FitResult {
    /// Square roots of the covariance diagonal.
    pub fn standard_errors(&self) -> Array1<f64> {
        standard_errors_from_covariance(&self.covariance)
    }
}

/// Fit `model` to the samples `(x_data, y_data)` starting from `initial`.
///
/// The rate constants of `initial` are used as given. The coefficients the
/// curve is linear in are first replaced by their least-squares values at
/// those rates, which keeps the solver out of the flat valleys where a mass
/// runs off to infinity while its rate goes to zero.
///
/// # Errors
///
/// * `InsufficientData` when there are fewer samples than free parameters
/// * `FunctionEvaluation` when the model is not finite at `initial`
/// * `ConvergenceFailure` when the solver stops without meeting a tolerance
pub fn fit_curve(
    model: DecayModel,
    x_data: &Array1<f64>,
    y_data: &Array1<f64>,
    initial: Array1<f64>,
    config: LmConfig,
) -> Result<FitResult> {
    let problem = CurveProblem::new(model, x_data, y_data)?;
    let n_data = problem.ndata();
    let n_params = model.parameter_count();

    if n_data < n_params {
        return Err(DryFitError::InsufficientData(format!(
            "model {} has {} free parameters but only {} points were selected",
            model.kind().number(),
            n_params,
            n_data
        )));
    }

    if initial.len() != n_params {
        return Err(DryFitError::DimensionMismatch(format!(
            "model {} takes {} parameters, got {}",
            model.kind().number(),
            n_params,
            initial.len()
        )));
    }

    let seeded = seed_linear_coefficients(&model, x_data, y_data, &initial);
    info!(
        model = model.kind().number(),
        n_data,
        initial = ?initial.to_vec(),
        seeded = ?seeded.to_vec(),
        "fitting"
    );

    let lm = LevenbergMarquardt::with_config(config).with_calc_jacobian(true);
    let result = lm.minimize(&problem, seeded)?;

    if !result.success {
        return Err(DryFitError::ConvergenceFailure(format!(
            "{} after {} iterations ({} function evaluations)",
            result.message, result.iterations, result.func_evals
        )));
    }

    let covariance = match result.jacobian {
        Some(ref jacobian) => covariance_from_fit(jacobian, result.cost, n_data, n_params),
        None => Array2::from_elem((n_params, n_params), f64::INFINITY),
    };

    let fit = FitResult {
        params: result.params,
        covariance,
        cost: result.cost,
        iterations: result.iterations,
        func_evals: result.func_evals,
        message: result.message,
    };

    let errors = fit.standard_errors();
    for ((name, value), err) in model
        .parameter_names()
        .iter()
        .zip(fit.params.iter())
        .zip(errors.iter())
    {
        debug!(parameter = name, value, stderr = err, "fitted");
    }
    debug!(covariance = ?fit.covariance, "parameter covariance");
    info!(
        cost = fit.cost,
        iterations = fit.iterations,
        message = %fit.message,
        "fit converged"
    );

    Ok(fit)
}

/// `initial` with the model's linear coefficients solved for by least squares
/// at the initial rates.
///
/// Falls back to `initial` when that linear problem is rank-deficient.
pub fn seed_linear_coefficients(
    model: &DecayModel,
    x_data: &Array1<f64>,
    y_data: &Array1<f64>,
    initial: &Array1<f64>,
) -> Array1<f64> {
    let (basis, target) = model.linear_system(x_data, y_data, initial);
    if basis.is_empty() || basis.iter().chain(target.iter()).any(|v| !v.is_finite()) {
        return initial.clone();
    }

    let (rows, cols) = basis.dim();
    let svd = ndarray_to_nalgebra(&basis).svd(true, true);
    let cutoff = f64::EPSILON * rows.max(cols) as f64 * svd.singular_values.max();
    if svd.rank(cutoff) < cols {
        debug!("linear coefficients are not identifiable at the initial rates");
        return initial.clone();
    }

    let Ok(coefficients) = svd.solve(&ndarray_vec_to_nalgebra(&target), cutoff) else {
        return initial.clone();
    };

    let mut seeded = initial.clone();
    for (&j, value) in model.linear_parameters().iter().zip(coefficients.iter()) {
        seeded[j] = *value;
    }
    seeded
}
