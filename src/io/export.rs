//! JSON export of a fit.
//!
//! The export carries everything the terminal report shows plus the solver
//! diagnostics and the parameter covariance. Non-finite numbers (an
//! undetermined covariance, for instance) are written as `null`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::data::FitRange;
use crate::error::{DryFitError, Result};
use crate::fit::FitResult;
use crate::models::DecayModel;
use crate::report::Report;

/// Serializable summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct FitExport {
    pub tool: String,
    pub version: String,
    pub input: String,
    pub model: u8,
    /// `[min, max]` in hours when the fit was restricted
    pub fit_range: Option<[f64; 2]>,
    pub n_samples: usize,
    pub n_fitted: usize,
    pub parameter_names: Vec<String>,
    pub params: Vec<f64>,
    pub standard_errors: Vec<f64>,
    pub covariance: Vec<Vec<f64>>,
    pub cost: f64,
    pub iterations: usize,
    pub func_evals: usize,
    pub message: String,
    pub report: Report,
}

impl FitExport {
    pub fn new(
        input: &Path,
        model: &DecayModel,
        fit_range: Option<&FitRange>,
        n_samples: usize,
        n_fitted: usize,
        fit: &FitResult,
        report: &Report,
    ) -> Self {
        Self {
            tool: "dryfit".to_string(),
            version: crate::VERSION.to_string(),
            input: input.display().to_string(),
            model: model.kind().number(),
            fit_range: fit_range.map(|r| [r.min, r.max]),
            n_samples,
            n_fitted,
            parameter_names: model
                .parameter_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            params: fit.params.to_vec(),
            standard_errors: fit.standard_errors().to_vec(),
            covariance: fit.covariance.rows().into_iter().map(|r| r.to_vec()).collect(),
            cost: fit.cost,
            iterations: fit.iterations,
            func_evals: fit.func_evals,
            message: fit.message.clone(),
            report: report.clone(),
        }
    }
}

/// Write `export` as pretty-printed JSON to `path`.
pub fn write_export_json(path: &Path, export: &FitExport) -> Result<()> {
    let io_err = |source| DryFitError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut writer, export)?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)
}
