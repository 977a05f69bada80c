//! Adapter from a drying-curve model and its data to a least-squares [`Problem`].
//!
//! Residuals are `model(t_i) - y_i`, all weighted equally. The Jacobian comes
//! from the model's analytic gradient.

use ndarray::{Array1, Array2};

use crate::error::{DryFitError, Result};
use crate::models::DecayModel;
use crate::problem::Problem;

/// A [`DecayModel`] paired with the samples it is fitted against.
#[derive(Debug, Clone)]
pub struct CurveProblem<'a> {
    model: DecayModel,
    x_data: &'a Array1<f64>,
    y_data: &'a Array1<f64>,
}

impl<'a> CurveProblem<'a> {
    /// Create a new problem over `x_data` (hours) and `y_data` (grams).
    pub fn new(model: DecayModel, x_data: &'a Array1<f64>, y_data: &'a Array1<f64>) -> Result<Self> {
        if x_data.len() != y_data.len() {
            return Err(DryFitError::DimensionMismatch(format!(
                "Expected x and y data to have the same length, got {} and {}",
                x_data.len(),
                y_data.len()
            )));
        }

        Ok(Self {
            model,
            x_data,
            y_data,
        })
    }

    pub fn model(&self) -> &DecayModel {
        &self.model
    }

    /// Number of data points.
    pub fn ndata(&self) -> usize {
        self.x_data.len()
    }

    fn check_params(&self, params: &Array1<f64>) -> Result<()> {
        if params.len() != self.model.parameter_count() {
            return Err(DryFitError::DimensionMismatch(format!(
                "Model {} takes {} parameters, got {}",
                self.model.kind().number(),
                self.model.parameter_count(),
                params.len()
            )));
        }
        Ok(())
    }
}

impl Problem for CurveProblem<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_params(params)?;
        Ok(self.model.eval_many(self.x_data, params) - self.y_data)
    }

    fn parameter_count(&self) -> usize {
        self.model.parameter_count()
    }

    fn residual_count(&self) -> usize {
        self.ndata()
    }

    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        self.check_params(params)?;

        let mut jacobian = Array2::zeros((self.ndata(), self.parameter_count()));
        for (mut row, &t) in jacobian.rows_mut().into_iter().zip(self.x_data.iter()) {
            row.assign(&self.model.gradient(t, params));
        }
        Ok(jacobian)
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}
