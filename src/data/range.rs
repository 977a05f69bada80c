//! Restricting the fit to a time window.

use std::fmt;
use std::str::FromStr;

use ndarray::Array1;
use nom::{
    character::complete::{char, space0},
    combinator::all_consuming,
    number::complete::double,
    sequence::{delimited, separated_pair},
    IResult, Parser,
};

use super::Dataset;
use crate::error::{DryFitError, Result};

/// Closed time interval `[min, max]` in hours.
#[derive(Debug, Clone, PartialEq)]
pub struct FitRange {
    pub min: f64,
    pub max: f64,
    raw: String,
}

fn bound(input: &str) -> IResult<&str, f64> {
    delimited(space0, double, space0).parse(input)
}

fn min_max(input: &str) -> IResult<&str, (f64, f64)> {
    all_consuming(separated_pair(bound, char(':'), bound)).parse(input)
}

impl FitRange {
    /// Parse `"min:max"`. Spaces around either bound are allowed.
    pub fn parse(text: &str) -> Result<Self> {
        let (_, (min, max)) = min_max(text).map_err(|_| {
            DryFitError::MalformedRange(format!("expected \"min:max\" in hours, got {text:?}"))
        })?;

        Ok(Self {
            min,
            max,
            raw: text.to_string(),
        })
    }

    pub fn contains(&self, t: f64) -> bool {
        self.min <= t && t <= self.max
    }
}

impl FromStr for FitRange {
    type Err = DryFitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The samples a fit runs against.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub x: Array1<f64>,
    pub y: Array1<f64>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Keep the samples whose time lies in `range`, in file order.
///
/// Without a range every sample is kept. A window that matches nothing gives
/// an empty selection.
pub fn select(dataset: &Dataset, range: Option<&FitRange>) -> Selection {
    let Some(range) = range else {
        return Selection {
            x: dataset.x().clone(),
            y: dataset.y().clone(),
        };
    };

    let (x, y): (Vec<f64>, Vec<f64>) = dataset
        .samples()
        .filter(|s| range.contains(s.time))
        .map(|s| (s.time, s.mass))
        .unzip();

    Selection {
        x: Array1::from(x),
        y: Array1::from(y),
    }
}
