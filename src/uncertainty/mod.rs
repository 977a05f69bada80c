//! Parameter uncertainty estimates at the least-squares solution.

pub mod covariance;

pub use covariance::{calculate_covariance, covariance_from_fit, standard_errors_from_covariance};
