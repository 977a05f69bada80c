use std::path::PathBuf;

use thiserror::Error;

/// Error types for the dryfit library.
#[derive(Error, Debug)]
pub enum DryFitError {
    /// The input file could not be opened or read.
    #[error("IO error reading '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data line is missing a column or holds a non-numeric token.
    #[error("Malformed data line {line} ({content:?}): {reason}")]
    MalformedLine {
        line: usize,
        content: String,
        reason: String,
    },

    /// The fit range is not of the form `min:max`.
    #[error("Malformed fit range: {0}")]
    MalformedRange(String),

    /// The input file holds no samples.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Fewer data points than free parameters.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error during model or residual evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Error indicating the solver failed to converge.
    #[error("Fit failed to converge: {0}")]
    ConvergenceFailure(String),

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebraError(String),

    /// Error while rendering the plot.
    #[error("Plot error: {0}")]
    Plot(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for dryfit operations.
pub type Result<T> = std::result::Result<T, DryFitError>;
