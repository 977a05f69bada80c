//! # Covariance Matrix Calculations
//!
//! This module provides functions for calculating the parameter covariance
//! matrix from the Jacobian at the least-squares solution.

use ndarray::{Array1, Array2};
use tracing::warn;

use crate::utils::ndarray_to_nalgebra;

/// Calculate covariance matrix from Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * pinv(J^T * J)
/// where:
///   - J is the Jacobian matrix
///   - redchi is the reduced chi-square (chi^2 / dof)
///
/// The pseudo-inverse comes from the SVD `J = U S Vᵀ` as `V S⁻² Vᵀ`, keeping
/// singular values above `eps * max(m, n) * s_max`. When any value falls below
/// that cutoff the parameters are not identifiable, and every entry is set to
/// `+inf`.
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Array2<f64> {
    let (m, n) = jacobian.dim();
    let unknown = || Array2::from_elem((n, n), f64::INFINITY);

    if m == 0 || n == 0 || jacobian.iter().any(|v| !v.is_finite()) {
        warn!("Jacobian is empty or not finite; covariance of the parameters could not be estimated");
        return unknown();
    }

    let svd = ndarray_to_nalgebra(jacobian).svd(false, true);
    let Some(v_t) = svd.v_t else {
        return unknown();
    };
    let singular_values = &svd.singular_values;
    let cutoff = f64::EPSILON * m.max(n) as f64 * singular_values.max();
    let rank = singular_values.iter().filter(|s| **s > cutoff).count();

    if rank < n {
        warn!(
            rank,
            n_params = n,
            "Jacobian is rank-deficient; covariance of the parameters could not be estimated"
        );
        return unknown();
    }

    let mut covar = Array2::zeros((n, n));
    for (k, s) in singular_values.iter().enumerate() {
        let weight = redchi / (s * s);
        for i in 0..n {
            for j in 0..n {
                covar[[i, j]] += weight * v_t[(k, i)] * v_t[(k, j)];
            }
        }
    }
    covar
}

/// Covariance of a fit with `cost = Σr²` over `n_data` points and `n_params` parameters.
///
/// With no degrees of freedom left (`n_data <= n_params`) the residual variance
/// is undefined and the covariance is filled with `+inf`.
pub fn covariance_from_fit(
    jacobian: &Array2<f64>,
    cost: f64,
    n_data: usize,
    n_params: usize,
) -> Array2<f64> {
    if n_data <= n_params {
        warn!(
            n_data,
            n_params, "no degrees of freedom left; covariance of the parameters could not be estimated"
        );
        return Array2::from_elem((n_params, n_params), f64::INFINITY);
    }

    let redchi = cost / (n_data - n_params) as f64;
    calculate_covariance(jacobian, redchi)
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements of the
/// covariance matrix. A negative or NaN variance gives NaN and an infinite one
/// gives `+inf`.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v >= 0.0 { v.sqrt() } else { f64::NAN })
}
