//! Measurement data: loading the two-column mass log and picking the fit window.

mod parse;
mod range;

pub use parse::{load_dataset, parse_dataset};
pub use range::{select, FitRange, Selection};

use ndarray::Array1;

/// Minutes per hour; raw times are logged in minutes.
pub const MINUTES_PER_HOUR: f64 = 60.0;

/// One mass measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Time since the start of drying, hours
    pub time: f64,
    /// Mass, grams
    pub mass: f64,
}

/// All samples of a run, in file order. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    x: Array1<f64>,
    y: Array1<f64>,
}

impl Dataset {
    /// Build a dataset from times (hours) and masses (grams).
    ///
    /// Returns `None` when the columns differ in length or are empty.
    pub fn from_columns(x: Vec<f64>, y: Vec<f64>) -> Option<Self> {
        if x.is_empty() || x.len() != y.len() {
            return None;
        }
        Some(Self {
            x: Array1::from(x),
            y: Array1::from(y),
        })
    }

    /// Times, hours.
    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    /// Masses, grams.
    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Mass of the first sample, the nominal initial mass `m0`.
    pub fn first_mass(&self) -> f64 {
        self.y[0]
    }

    /// Mass of the last sample, the current mass `mlast`.
    pub fn last_mass(&self) -> f64 {
        self.y[self.y.len() - 1]
    }

    /// Earliest and latest sample times.
    pub fn time_span(&self) -> (f64, f64) {
        self.x
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
                (lo.min(t), hi.max(t))
            })
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.x
            .iter()
            .zip(self.y.iter())
            .map(|(&time, &mass)| Sample { time, mass })
    }
}
