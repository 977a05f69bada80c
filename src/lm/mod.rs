//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides an implementation of the Levenberg-Marquardt algorithm
//! for nonlinear least-squares optimization, split into the iteration driver,
//! its configuration, the step solver, the trust region and the stopping
//! rules. Parameters are scaled by the running maximum of the Jacobian column
//! norms, so the damping acts on a fixed scale instead of on the current
//! curvature.

pub mod algorithm;
pub mod config;
pub mod convergence;
pub mod step;
pub mod trust_region;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::{DecompositionMethod, DiffMethod, LmConfig};
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
pub use step::{LmStep, StepResult};
pub use trust_region::{Reduction, TrustRegion};
