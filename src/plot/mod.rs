//! Plotting the measured masses against the fitted curve.
//!
//! The curve is drawn from the first sample time to 48 hours past the last
//! one, so the plot shows where drying is heading.

pub mod ascii;
pub mod svg;

pub use ascii::render_ascii_plot;
pub use svg::render_svg;

use ndarray::Array1;

use crate::data::Dataset;
use crate::models::DecayModel;

/// Number of points the fitted curve is sampled at.
pub const CURVE_POINTS: usize = 1000;

/// How far past the last sample the curve is extended, hours.
pub const EXTRAPOLATION_HOURS: f64 = 48.0;

/// Time window of the fitted curve: `[min(x), max(x) + 48 h]`.
pub fn curve_window(dataset: &Dataset) -> (f64, f64) {
    let (t_min, t_max) = dataset.time_span();
    (t_min, t_max + EXTRAPOLATION_HOURS)
}

/// Evaluate the model at `n` evenly spaced times over `[t_min, t_max]`.
pub fn sample_curve(
    model: &DecayModel,
    params: &Array1<f64>,
    t_min: f64,
    t_max: f64,
    n: usize,
) -> Vec<(f64, f64)> {
    Array1::linspace(t_min, t_max, n)
        .iter()
        .map(|&t| (t, model.eval(t, params)))
        .collect()
}

/// The fitted curve over [`curve_window`] at [`CURVE_POINTS`] samples.
pub fn fitted_curve(dataset: &Dataset, model: &DecayModel, params: &Array1<f64>) -> Vec<(f64, f64)> {
    let (t_min, t_max) = curve_window(dataset);
    sample_curve(model, params, t_min, t_max, CURVE_POINTS)
}

/// Smallest and largest finite value among `values`.
fn finite_bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    (lo <= hi).then_some((lo, hi))
}

/// Widen `[min, max]` by `frac` of its span on each side. A zero span is
/// widened by one unit.
fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 { span * frac } else { 1.0 };
    (min - pad, max + pad)
}
