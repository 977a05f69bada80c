//! Parsing the `time mass` log.
//!
//! Each line holds at least two whitespace-separated numbers: elapsed time in
//! minutes and mass in grams. Anything after the second column is ignored.

use std::fs;
use std::path::Path;

use nom::{combinator::all_consuming, number::complete::double, IResult, Parser};
use tracing::debug;

use super::{Dataset, MINUTES_PER_HOUR};
use crate::error::{DryFitError, Result};

fn float(input: &str) -> IResult<&str, f64> {
    double(input)
}

/// Parse one whitespace-delimited token as a float, rejecting trailing garbage.
fn number(token: &str) -> Option<f64> {
    all_consuming(float).parse(token).ok().map(|(_, value)| value)
}

fn parse_line(index: usize, line: &str) -> Result<(f64, f64)> {
    let malformed = |reason: String| DryFitError::MalformedLine {
        line: index + 1,
        content: line.to_string(),
        reason,
    };

    let mut tokens = line.split_whitespace();
    let (first, second) = match (tokens.next(), tokens.next()) {
        (Some(first), Some(second)) => (first, second),
        (first, _) => {
            return Err(malformed(format!(
                "expected two columns, found {}",
                usize::from(first.is_some())
            )))
        }
    };

    let time = number(first).ok_or_else(|| malformed(format!("invalid time {first:?}")))?;
    let mass = number(second).ok_or_else(|| malformed(format!("invalid mass {second:?}")))?;
    Ok((time, mass))
}

/// Parse the raw columns of `text`, in line order, without unit conversion.
///
/// Line numbers in errors are 1-based.
pub fn parse_columns(text: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut times = Vec::new();
    let mut masses = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let (time, mass) = parse_line(index, line)?;
        times.push(time);
        masses.push(mass);
    }

    Ok((times, masses))
}

/// Parse a mass log and convert its times from minutes to hours.
pub fn parse_dataset(text: &str) -> Result<Dataset> {
    let (minutes, masses) = parse_columns(text)?;
    let hours = minutes.into_iter().map(|t| t / MINUTES_PER_HOUR).collect();
    Dataset::from_columns(hours, masses).ok_or(DryFitError::EmptyDataset)
}

/// Read and parse the mass log at `path`.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let text = fs::read_to_string(path).map_err(|source| DryFitError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = parse_dataset(&text)?;
    debug!(
        path = %path.display(),
        samples = dataset.len(),
        "loaded dataset"
    );
    Ok(dataset)
}
