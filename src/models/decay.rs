//! Drying-curve models for wood mass over time.
//!
//! Two functional forms are available, each with `m0` either fitted or held
//! at the first measured mass:
//!
//! - single exponential: `m(t) = (m0 - mi) * exp(-k*t) + mi`
//! - double exponential: `m(t) = C1*exp(r1*t) + C2*exp(r2*t) + m0 - C1 - C2`
//!
//! Where:
//! - `m0`: mass at `t = 0`
//! - `mi`: asymptotic (dry) mass, `m0 - C1 - C2` for the double exponential
//! - `k`, `r1`, `r2`: rate constants per hour
//! - `C1`, `C2`: amplitudes of the two exponential terms

use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Initial guess for the asymptotic mass, grams.
const GUESS_MI: f64 = 200.0;

/// Initial guess for the single-exponential rate, per hour.
const GUESS_K: f64 = 0.02;

/// Initial guesses for the double-exponential amplitudes and rates.
const GUESS_C1: f64 = 71.4;
const GUESS_C2: f64 = -24.2;
const GUESS_R1: f64 = -0.00543;
const GUESS_R2: f64 = 0.00543;

/// Model number as requested on the command line.
///
/// Numbers other than 1-4, and a missing number, are kept as `Unknown` so the
/// fallback to model 1 happens in one visible place ([`ModelTag::resolve`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTag {
    One,
    Two,
    Three,
    Four,
    Unknown(Option<i64>),
}

impl ModelTag {
    pub fn from_number(number: i64) -> Self {
        match number {
            1 => ModelTag::One,
            2 => ModelTag::Two,
            3 => ModelTag::Three,
            4 => ModelTag::Four,
            other => ModelTag::Unknown(Some(other)),
        }
    }

    /// Map the tag to a model. Unknown or missing tags use model 1.
    pub fn resolve(self) -> ModelKind {
        match self {
            ModelTag::One => ModelKind::SingleFitted,
            ModelTag::Two => ModelKind::SingleFixed,
            ModelTag::Three => ModelKind::DoubleFitted,
            ModelTag::Four => ModelKind::DoubleFixed,
            ModelTag::Unknown(number) => {
                match number {
                    Some(n) => warn!(requested = n, "unknown model number, using model 1"),
                    None => warn!("no model number given, using model 1"),
                }
                ModelKind::SingleFitted
            }
        }
    }
}

impl From<Option<i64>> for ModelTag {
    fn from(number: Option<i64>) -> Self {
        number.map_or(ModelTag::Unknown(None), ModelTag::from_number)
    }
}

impl fmt::Display for ModelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelTag::One => write!(f, "1"),
            ModelTag::Two => write!(f, "2"),
            ModelTag::Three => write!(f, "3"),
            ModelTag::Four => write!(f, "4"),
            ModelTag::Unknown(Some(n)) => write!(f, "{n}"),
            ModelTag::Unknown(None) => write!(f, "None"),
        }
    }
}

/// The four drying-curve variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Model 1: single exponential, `m0` fitted.
    SingleFitted,
    /// Model 2: single exponential, `m0` fixed.
    SingleFixed,
    /// Model 3: double exponential, `m0` fitted.
    DoubleFitted,
    /// Model 4: double exponential, `m0` fixed.
    DoubleFixed,
}

impl ModelKind {
    pub fn number(self) -> u8 {
        match self {
            ModelKind::SingleFitted => 1,
            ModelKind::SingleFixed => 2,
            ModelKind::DoubleFitted => 3,
            ModelKind::DoubleFixed => 4,
        }
    }

    /// Names of the free parameters, in vector order.
    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::SingleFitted => &["m0", "mi", "k"],
            ModelKind::SingleFixed => &["mi", "k"],
            ModelKind::DoubleFitted => &["C1", "C2", "m0", "r1", "r2"],
            ModelKind::DoubleFixed => &["C1", "C2", "r1", "r2"],
        }
    }
}

/// Masses derived from a fitted parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMasses {
    /// Initial mass, grams
    pub m0: f64,
    /// Asymptotic (dry) mass, grams
    pub mi: f64,
    /// Single-exponential rate constant, when the model has one
    pub k: Option<f64>,
}

/// A drying-curve model ready to evaluate.
///
/// The fixed-`m0` variants carry the first measured mass, so every variant
/// evaluates as a pure function of `(t, params)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DecayModel {
    SingleFitted,
    SingleFixed { m0: f64 },
    DoubleFitted,
    DoubleFixed { m0: f64 },
}

impl DecayModel {
    /// Build the model for `kind`. `m0_sample` is the first measured mass.
    pub fn new(kind: ModelKind, m0_sample: f64) -> Self {
        match kind {
            ModelKind::SingleFitted => DecayModel::SingleFitted,
            ModelKind::SingleFixed => DecayModel::SingleFixed { m0: m0_sample },
            ModelKind::DoubleFitted => DecayModel::DoubleFitted,
            ModelKind::DoubleFixed => DecayModel::DoubleFixed { m0: m0_sample },
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            DecayModel::SingleFitted => ModelKind::SingleFitted,
            DecayModel::SingleFixed { .. } => ModelKind::SingleFixed,
            DecayModel::DoubleFitted => ModelKind::DoubleFitted,
            DecayModel::DoubleFixed { .. } => ModelKind::DoubleFixed,
        }
    }

    pub fn parameter_names(&self) -> &'static [&'static str] {
        self.kind().parameter_names()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_names().len()
    }

    /// Starting point for the solver.
    pub fn initial_guess(&self, m0_sample: f64) -> Array1<f64> {
        match self {
            DecayModel::SingleFitted => Array1::from(vec![m0_sample, GUESS_MI, GUESS_K]),
            DecayModel::SingleFixed { .. } => Array1::from(vec![GUESS_MI, GUESS_K]),
            DecayModel::DoubleFitted => {
                Array1::from(vec![GUESS_C1, GUESS_C2, m0_sample, GUESS_R1, GUESS_R2])
            }
            DecayModel::DoubleFixed { .. } => {
                Array1::from(vec![GUESS_C1, GUESS_C2, GUESS_R1, GUESS_R2])
            }
        }
    }

    /// Mass at time `t` (hours).
    ///
    /// `params` must have [`parameter_count`](Self::parameter_count) entries.
    pub fn eval(&self, t: f64, params: &Array1<f64>) -> f64 {
        match *self {
            DecayModel::SingleFitted => single(t, params[0], params[1], params[2]),
            DecayModel::SingleFixed { m0 } => single(t, m0, params[0], params[1]),
            DecayModel::DoubleFitted => {
                double(t, params[0], params[1], params[2], params[3], params[4])
            }
            DecayModel::DoubleFixed { m0 } => {
                double(t, params[0], params[1], m0, params[2], params[3])
            }
        }
    }

    /// Evaluate at every time in `t`.
    pub fn eval_many(&self, t: &Array1<f64>, params: &Array1<f64>) -> Array1<f64> {
        t.mapv(|t| self.eval(t, params))
    }

    /// Partial derivatives of the mass at `t` with respect to each free parameter.
    pub fn gradient(&self, t: f64, params: &Array1<f64>) -> Array1<f64> {
        match *self {
            DecayModel::SingleFitted => {
                let (m0, mi, k) = (params[0], params[1], params[2]);
                let e = (-k * t).exp();
                Array1::from(vec![e, 1.0 - e, -(m0 - mi) * t * e])
            }
            DecayModel::SingleFixed { m0 } => {
                let (mi, k) = (params[0], params[1]);
                let e = (-k * t).exp();
                Array1::from(vec![1.0 - e, -(m0 - mi) * t * e])
            }
            DecayModel::DoubleFitted => {
                let (c1, c2, r1, r2) = (params[0], params[1], params[3], params[4]);
                let (e1, e2) = ((r1 * t).exp(), (r2 * t).exp());
                Array1::from(vec![e1 - 1.0, e2 - 1.0, 1.0, c1 * t * e1, c2 * t * e2])
            }
            DecayModel::DoubleFixed { .. } => {
                let (c1, c2, r1, r2) = (params[0], params[1], params[2], params[3]);
                let (e1, e2) = ((r1 * t).exp(), (r2 * t).exp());
                Array1::from(vec![e1 - 1.0, e2 - 1.0, c1 * t * e1, c2 * t * e2])
            }
        }
    }

    /// Indices of the parameters the mass is linear in.
    ///
    /// The basis multiplying each of them depends only on the rate constants.
    pub fn linear_parameters(&self) -> &'static [usize] {
        match self {
            DecayModel::SingleFitted => &[0, 1],
            DecayModel::SingleFixed { .. } => &[0],
            DecayModel::DoubleFitted => &[0, 1, 2],
            DecayModel::DoubleFixed { .. } => &[0, 1],
        }
    }

    /// Linear least-squares system for the [`linear_parameters`](Self::linear_parameters)
    /// with the rates in `params` held fixed.
    ///
    /// Returns the basis (one column per linear parameter) and the samples `y`
    /// minus the part of the curve that does not scale with those parameters.
    pub fn linear_system(
        &self,
        t: &Array1<f64>,
        y: &Array1<f64>,
        params: &Array1<f64>,
    ) -> (Array2<f64>, Array1<f64>) {
        let linear = self.linear_parameters();

        let mut basis = Array2::zeros((t.len(), linear.len()));
        for (i, &ti) in t.iter().enumerate() {
            let gradient = self.gradient(ti, params);
            for (column, &j) in linear.iter().enumerate() {
                basis[[i, column]] = gradient[j];
            }
        }

        let mut rates_only = params.clone();
        for &j in linear {
            rates_only[j] = 0.0;
        }
        let target = y - &self.eval_many(t, &rates_only);

        (basis, target)
    }

    /// Initial and asymptotic masses implied by a fitted parameter vector.
    pub fn derived(&self, params: &Array1<f64>) -> DerivedMasses {
        match *self {
            DecayModel::SingleFitted => DerivedMasses {
                m0: params[0],
                mi: params[1],
                k: Some(params[2]),
            },
            DecayModel::SingleFixed { m0 } => DerivedMasses {
                m0,
                mi: params[0],
                k: Some(params[1]),
            },
            DecayModel::DoubleFitted => {
                let m0 = params[2];
                DerivedMasses {
                    m0,
                    mi: m0 - params[0] - params[1],
                    k: None,
                }
            }
            DecayModel::DoubleFixed { m0 } => DerivedMasses {
                m0,
                mi: m0 - params[0] - params[1],
                k: None,
            },
        }
    }
}

fn single(t: f64, m0: f64, mi: f64, k: f64) -> f64 {
    (m0 - mi) * (-k * t).exp() + mi
}

fn double(t: f64, c1: f64, c2: f64, m0: f64, r1: f64, r2: f64) -> f64 {
    c1 * (r1 * t).exp() + c2 * (r2 * t).exp() + m0 - c1 - c2
}
