//! Evaporated-mass figures derived from a fitted curve.

use std::fmt;

use ndarray::Array1;
use serde::Serialize;

use crate::models::{DecayModel, ModelKind};

/// Round half to even, the way numpy does.
pub fn round_even(value: f64) -> f64 {
    value.round_ties_even()
}

/// Round half to even at `decimals` decimal places.
pub fn round_even_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Fitted masses and the moisture figures computed from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub model: ModelKind,
    /// Initial mass, fitted or first sample, grams
    pub m0: f64,
    /// Asymptotic dry mass, grams
    pub mi: f64,
    /// Rate constant of the single-exponential models, per hour
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<f64>,
    /// Last measured mass, grams
    pub mlast: f64,
    /// `m0 - mi`, whole grams
    pub evap_final: f64,
    /// `(m0 - mi) / mi` in percent, one decimal
    pub evap_final_pct: f64,
    /// `mlast - mi`, whole grams
    pub evap_last: f64,
    /// `(mlast - mi) / mi` in percent, one decimal
    pub evap_last_pct: f64,
}

impl Report {
    /// Derive the report from fitted `params` and the last measured mass.
    pub fn compute(model: &DecayModel, params: &Array1<f64>, mlast: f64) -> Self {
        let derived = model.derived(params);
        Self::from_masses(model.kind(), derived.m0, derived.mi, derived.k, mlast)
    }

    pub fn from_masses(model: ModelKind, m0: f64, mi: f64, k: Option<f64>, mlast: f64) -> Self {
        Self {
            model,
            m0,
            mi,
            k,
            mlast,
            evap_final: round_even(m0 - mi),
            evap_final_pct: round_even_to((m0 - mi) / mi * 100.0, 1),
            evap_last: round_even(mlast - mi),
            evap_last_pct: round_even_to((mlast - mi) / mi * 100.0, 1),
        }
    }
}

/// The parameter table and the two summary sentences.
///
/// Single-exponential models list `m0 mi k mlast`, double-exponential ones
/// `m0 mi mlast`.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.model {
            ModelKind::SingleFitted | ModelKind::SingleFixed => writeln!(
                f,
                "m0\tmi\tk\tmlast\n{:?}\t{:?}\t{:?}\t{:?}",
                self.m0,
                self.mi,
                self.k.unwrap_or(f64::NAN),
                self.mlast
            )?,
            ModelKind::DoubleFitted | ModelKind::DoubleFixed => writeln!(
                f,
                "m0\tmi\tmlast\n{:?}\t{:?}\t{:?}",
                self.m0, self.mi, self.mlast
            )?,
        }

        writeln!(
            f,
            "Total evaporated mass at final state: {:?}g ({:?}%)",
            self.evap_final, self.evap_final_pct
        )?;
        writeln!(
            f,
            "Evaporation mass left: {:?}g ({:?}%)",
            self.evap_last, self.evap_last_pct
        )
    }
}

/// Render the parameter table and the two summary sentences.
pub fn format_report(report: &Report) -> String {
    report.to_string()
}
