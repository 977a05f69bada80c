//! Library pipeline: parse a log, pick the fit window, fit, report.

use approx::assert_relative_eq;
use dryfit::data::{parse_dataset, select, FitRange};
use dryfit::fit::fit_curve;
use dryfit::lm::LmConfig;
use dryfit::models::{DecayModel, ModelKind};
use dryfit::plot::{curve_window, fitted_curve};
use dryfit::report::{format_report, Report};
use dryfit::uncertainty::covariance_from_fit;
use dryfit::DryFitError;
use ndarray::{Array1, Array2};

use crate::test_helpers::{approx_eq, mass_log, single_exponential, with_noise};

/// Log rows every 90 minutes for 60 hours of a 250 g board drying to 205 g.
fn board_rows() -> Vec<(f64, f64)> {
    (0..=40)
        .map(|i| {
            let minutes = 90.0 * i as f64;
            (minutes, single_exponential(minutes / 60.0, 250.0, 205.0, 0.035))
        })
        .collect()
}

#[test]
fn test_parse_select_fit_report() {
    let dataset = parse_dataset(&mass_log(&board_rows())).unwrap();
    assert_eq!(dataset.len(), 41);
    assert_eq!(dataset.time_span(), (0.0, 60.0));

    let range = FitRange::parse("6:45").unwrap();
    let selection = select(&dataset, Some(&range));
    assert_eq!(selection.len(), 27);
    assert!(selection.x.iter().all(|t| (6.0..=45.0).contains(t)));

    let m0 = dataset.first_mass();
    let model = DecayModel::new(ModelKind::SingleFixed, m0);
    let fit = fit_curve(
        model,
        &selection.x,
        &selection.y,
        model.initial_guess(m0),
        LmConfig::default(),
    )
    .unwrap();

    assert_relative_eq!(fit.params[0], 205.0, epsilon = 1e-4);
    assert_relative_eq!(fit.params[1], 0.035, epsilon = 1e-6);

    let report = Report::compute(&model, &fit.params, dataset.last_mass());
    assert_eq!(report.evap_final, 45.0);
    assert_eq!(report.evap_final_pct, 22.0);
    // 45 g * exp(-2.1) is about 5.5 g still to go
    assert_eq!(report.evap_last, 6.0);
    assert_eq!(report.evap_last_pct, 2.7);

    let text = format_report(&report);
    assert!(text.starts_with("m0\tmi\tk\tmlast\n250.0\t"));
    assert!(text.contains("Total evaporated mass at final state: 45.0g (22.0%)"));
    assert!(text.contains("Evaporation mass left: 6.0g (2.7%)"));

    let curve = fitted_curve(&dataset, &model, &fit.params);
    assert_eq!(curve.len(), 1000);
    assert_eq!(curve_window(&dataset), (0.0, 108.0));
    assert!(approx_eq(curve[0].1, 250.0, 1e-6));
}

#[test]
fn test_noisy_board_fit() {
    let dataset = parse_dataset(&mass_log(&board_rows())).unwrap();
    let noisy = with_noise(dataset.y(), 0.2, 42);

    let m0 = noisy[0];
    let model = DecayModel::new(ModelKind::SingleFitted, m0);
    let fit = fit_curve(
        model,
        dataset.x(),
        &noisy,
        model.initial_guess(m0),
        LmConfig::default(),
    )
    .unwrap();

    assert!(approx_eq(fit.params[0], 250.0, 0.5), "{}", fit.params);
    assert!(approx_eq(fit.params[1], 205.0, 1.0), "{}", fit.params);
    assert!(approx_eq(fit.params[2], 0.035, 0.005), "{}", fit.params);

    let errors = fit.standard_errors();
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|e| e.is_finite() && *e > 0.0));
    // True values sit within a few standard errors
    assert!((fit.params[1] - 205.0).abs() < 5.0 * errors[1]);
}

#[test]
fn test_linear_covariance_matches_closed_form() {
    // Straight line through 5 points: var(slope) = s² / Sxx
    let x = Array1::from(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    let residuals = Array1::from(vec![0.1, -0.2, 0.05, 0.15, -0.1]);
    let cost: f64 = residuals.iter().map(|r| r * r).sum();

    let mut jacobian = Array2::zeros((5, 2));
    for (i, xi) in x.iter().enumerate() {
        jacobian[[i, 0]] = *xi;
        jacobian[[i, 1]] = 1.0;
    }

    let covar = covariance_from_fit(&jacobian, cost, 5, 2);
    let s2 = cost / 3.0;
    let sxx = 10.0;
    assert_relative_eq!(covar[[0, 0]], s2 / sxx, epsilon = 1e-12);
    assert_relative_eq!(covar[[1, 1]], s2 * (1.0 / 5.0 + 4.0 / sxx), epsilon = 1e-12);
    assert_relative_eq!(covar[[0, 1]], -s2 * 2.0 / sxx, epsilon = 1e-12);
}

#[test]
fn test_window_without_enough_points() {
    let dataset = parse_dataset(&mass_log(&board_rows())).unwrap();
    let range = FitRange::parse("59:100").unwrap();
    let selection = select(&dataset, Some(&range));
    assert_eq!(selection.len(), 1);

    let model = DecayModel::new(ModelKind::SingleFixed, dataset.first_mass());
    let err = fit_curve(
        model,
        &selection.x,
        &selection.y,
        model.initial_guess(dataset.first_mass()),
        LmConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DryFitError::InsufficientData(_)));
}

#[test]
fn test_malformed_log_reports_line() {
    let err = parse_dataset("0 250\n60 249\n120 x\n").unwrap_err();
    match err {
        DryFitError::MalformedLine { line, .. } => assert_eq!(line, 3),
        other => panic!("unexpected error: {other}"),
    }
}
