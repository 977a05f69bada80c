//! Each drying model fitted to a curve generated from known parameters.

use approx::assert_relative_eq;
use dryfit::fit::fit_curve;
use dryfit::lm::LmConfig;
use dryfit::models::{DecayModel, ModelKind, ModelTag};
use dryfit::report::Report;
use ndarray::Array1;

use crate::test_helpers::{array_approx_eq, double_exponential, single_exponential};

fn single_curve() -> (Array1<f64>, Array1<f64>) {
    let x = Array1::from_iter((0..40).map(|i| 3.0 * i as f64));
    let y = x.mapv(|t| single_exponential(t, 250.0, 205.0, 0.035));
    (x, y)
}

fn double_curve() -> (Array1<f64>, Array1<f64>) {
    let x = Array1::from_iter((0..60).map(|i| 4.0 * i as f64));
    let y = x.mapv(|t| double_exponential(t, 60.0, -20.0, 250.0, -0.006, 0.004));
    (x, y)
}

fn fit(kind: ModelKind, x: &Array1<f64>, y: &Array1<f64>) -> (DecayModel, Array1<f64>) {
    let m0 = y[0];
    let model = DecayModel::new(kind, m0);
    let result = fit_curve(model, x, y, model.initial_guess(m0), LmConfig::default()).unwrap();
    (model, result.params)
}

#[test]
fn test_single_exponential_fitted_m0() {
    let (x, y) = single_curve();
    let (model, params) = fit(ModelKind::SingleFitted, &x, &y);

    assert_eq!(model.parameter_names(), ["m0", "mi", "k"]);
    assert!(
        array_approx_eq(&params, &Array1::from(vec![250.0, 205.0, 0.035]), 1e-4),
        "{params}"
    );
}

#[test]
fn test_single_exponential_fixed_m0() {
    let (x, y) = single_curve();
    let (model, params) = fit(ModelKind::SingleFixed, &x, &y);

    assert_eq!(model, DecayModel::SingleFixed { m0: 250.0 });
    assert_relative_eq!(params[0], 205.0, epsilon = 1e-4);
    assert_relative_eq!(params[1], 0.035, epsilon = 1e-6);
}

#[test]
fn test_double_exponential_fitted_m0() {
    let (x, y) = double_curve();
    let (model, params) = fit(ModelKind::DoubleFitted, &x, &y);

    assert_eq!(params.len(), 5);
    let derived = model.derived(&params);
    assert_relative_eq!(derived.m0, 250.0, epsilon = 1e-4);
    assert_relative_eq!(derived.mi, 210.0, epsilon = 1e-3);
    assert_eq!(derived.k, None);
}

#[test]
fn test_double_exponential_fixed_m0() {
    let (x, y) = double_curve();
    let (model, params) = fit(ModelKind::DoubleFixed, &x, &y);

    assert!(
        array_approx_eq(&params, &Array1::from(vec![60.0, -20.0, -0.006, 0.004]), 1e-4),
        "{params}"
    );

    let report = Report::compute(&model, &params, *y.last().unwrap());
    assert_eq!(report.m0, 250.0);
    assert_eq!(report.evap_final, 40.0);
    assert_eq!(report.evap_final_pct, 19.0);
}

#[test]
fn test_unknown_tags_fit_like_model_one() {
    let (x, y) = single_curve();

    for tag in [ModelTag::from_number(0), ModelTag::from_number(7), ModelTag::from(None::<i64>)] {
        let kind = tag.resolve();
        assert_eq!(kind, ModelKind::SingleFitted);

        let (_, params) = fit(kind, &x, &y);
        assert_relative_eq!(params[1], 205.0, epsilon = 1e-4);
    }
}

/// A fast and a slow drying phase, `180 + 50 e^(-0.05 h) + 20 e^(-0.005 h)`,
/// logged every two hours.
fn two_phase_curve() -> (Array1<f64>, Array1<f64>) {
    let x = Array1::from_iter((0..60).map(|i| 2.0 * i as f64));
    let y = x.mapv(|t| 180.0 + 50.0 * (-0.05 * t).exp() + 20.0 * (-0.005 * t).exp());
    (x, y)
}

#[test]
fn test_double_exponential_beats_single_on_two_phases() {
    let (x, y) = two_phase_curve();
    let m0 = y[0];

    let single = DecayModel::new(ModelKind::SingleFixed, m0);
    let single_fit = fit_curve(single, &x, &y, single.initial_guess(m0), LmConfig::default()).unwrap();

    let double = DecayModel::new(ModelKind::DoubleFixed, m0);
    let double_fit = fit_curve(double, &x, &y, double.initial_guess(m0), LmConfig::default()).unwrap();

    // Model 4 nests model 2, so it can never fit worse
    assert!(
        double_fit.cost <= single_fit.cost,
        "double {} vs single {}",
        double_fit.cost,
        single_fit.cost
    );
    assert!(double_fit.cost < 1e-6, "{}", double_fit.cost);
    assert_relative_eq!(double.derived(&double_fit.params).mi, 180.0, epsilon = 1e-3);

    let double = DecayModel::new(ModelKind::DoubleFitted, m0);
    let fitted_m0 = fit_curve(double, &x, &y, double.initial_guess(m0), LmConfig::default()).unwrap();
    assert!(fitted_m0.cost < 1e-6, "{}", fitted_m0.cost);
    assert_relative_eq!(double.derived(&fitted_m0.params).mi, 180.0, epsilon = 1e-3);
}

#[test]
fn test_near_linear_small_board() {
    // 100 g to 60 g over five hours, steps shrinking by a gram each time
    let x = Array1::from_iter((0..5).map(|i| 1.25 * i as f64));
    let y = Array1::from(vec![100.0, 87.0, 76.0, 67.0, 60.0]);

    for kind in [ModelKind::SingleFitted, ModelKind::SingleFixed] {
        let (model, params) = fit(kind, &x, &y);
        let report = Report::compute(&model, &params, 60.0);

        assert!(report.mi > 0.0 && report.mi < 60.0, "{params}");
        assert!(report.evap_final >= 0.0);
        assert!(report.evap_last >= 0.0);
    }
}
