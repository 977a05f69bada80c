//! Command-line interface definition.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Wood evaporated mass estimation.
///
/// Fits a drying curve to a two-column log of elapsed time (minutes) and mass
/// (grams), then reports how much water has evaporated and how much is left.
#[derive(Parser, Debug, Clone)]
#[command(name = "dryfit", version, author)]
pub struct Cli {
    /// Fit range in hours given as min:max
    #[arg(short = 'r', long = "fit-range", value_name = "MIN:MAX", allow_hyphen_values = true)]
    pub fit_range: Option<String>,

    /// Mathematical model: 1 and 2 single exponential (m0 fitted / fixed),
    /// 3 and 4 double exponential (m0 fitted / fixed); anything else uses 1
    #[arg(short, long, allow_negative_numbers = true)]
    pub model: Option<i64>,

    /// Where to write the SVG plot [default: <FILENAME>.fit.svg]
    #[arg(long, value_name = "PATH", conflicts_with = "no_plot")]
    pub plot: Option<PathBuf>,

    /// Do not write a plot
    #[arg(long)]
    pub no_plot: bool,

    /// Also print a plot to the terminal
    #[arg(long)]
    pub ascii: bool,

    /// Write the fit and report as JSON
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Cap on solver trial steps [default: 200 * (parameters + 1)]
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Mass log: whitespace-separated time (minutes) and mass (grams) per line
    pub filename: PathBuf,
}

impl Cli {
    /// Default log level for the verbosity count; `RUST_LOG` takes precedence.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
