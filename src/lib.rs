//! # dryfit
//!
//! `dryfit` fits drying curves to wood mass logs and estimates how much water
//! has evaporated and how much is still to go.
//!
//! The library provides:
//! - parsing of two-column `time mass` logs and fit-window selection
//! - four single/double exponential drying models with analytic gradients
//! - a Levenberg-Marquardt least-squares solver with covariance estimation
//! - the evaporated-mass report, SVG and terminal plots, and JSON export
//!
//! ## Basic Usage
//!
//! ```
//! use dryfit::data::parse_dataset;
//! use dryfit::fit::fit_curve;
//! use dryfit::lm::LmConfig;
//! use dryfit::models::{DecayModel, ModelTag};
//! use dryfit::report::Report;
//!
//! // minutes, grams
//! let log = "0 250\n120 247.3\n240 244.8\n480 240.6\n960 233.9\n1920 225.4\n3840 216.9\n";
//! let dataset = parse_dataset(log).unwrap();
//!
//! let m0 = dataset.first_mass();
//! let model = DecayModel::new(ModelTag::from_number(1).resolve(), m0);
//! let fit = fit_curve(model, dataset.x(), dataset.y(), model.initial_guess(m0), LmConfig::default())
//!     .unwrap();
//!
//! let report = Report::compute(&model, &fit.params, dataset.last_mass());
//! assert!(report.mi < m0);
//! ```

pub mod app;
pub mod cli;
pub mod data;
pub mod error;
pub mod fit;
pub mod io;
pub mod lm;
pub mod model;
pub mod models;
pub mod plot;
pub mod problem;
pub mod report;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use error::{DryFitError, Result};
pub use fit::{fit_curve, FitResult};
pub use lm::LevenbergMarquardt;
pub use models::{DecayModel, ModelKind, ModelTag};
pub use problem::Problem;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
