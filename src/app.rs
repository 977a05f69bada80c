//! The dryfit pipeline: load → select → fit → report → plot.
//!
//! Each stage takes the previous stage's value and returns the next one, so
//! the whole run is visible in [`run`]. Everything the user reads goes to the
//! writer passed in; diagnostics go through `tracing`.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::Cli;
use crate::data::{load_dataset, select, Dataset, FitRange, Selection};
use crate::fit::{fit_curve, FitResult};
use crate::io::{write_export_json, FitExport};
use crate::lm::LmConfig;
use crate::models::{DecayModel, ModelTag};
use crate::plot::{fitted_curve, render_ascii_plot, render_svg};
use crate::report::Report;

/// Terminal plot size, characters.
const ASCII_SIZE: (usize, usize) = (72, 20);

/// Everything a run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    /// `min:max` in hours as typed, parsed once the model line is out
    pub fit_range: Option<String>,
    pub model: ModelTag,
    /// SVG output path, `None` to skip the plot
    pub plot: Option<PathBuf>,
    pub ascii: bool,
    pub export: Option<PathBuf>,
    pub lm: LmConfig,
}

impl RunConfig {
    /// A run over `input` with every option at its default.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        Self {
            plot: Some(default_plot_path(&input)),
            input,
            fit_range: None,
            model: ModelTag::Unknown(None),
            ascii: false,
            export: None,
            lm: LmConfig::default(),
        }
    }

    pub fn from_cli(cli: &Cli) -> Self {
        let plot = if cli.no_plot {
            None
        } else {
            Some(
                cli.plot
                    .clone()
                    .unwrap_or_else(|| default_plot_path(&cli.filename)),
            )
        };

        Self {
            input: cli.filename.clone(),
            fit_range: cli.fit_range.clone(),
            model: ModelTag::from(cli.model),
            plot,
            ascii: cli.ascii,
            export: cli.export.clone(),
            lm: LmConfig {
                max_iterations: cli.max_iterations,
                ..LmConfig::default()
            },
        }
    }
}

/// `<input>.fit.svg`, next to the input file.
pub fn default_plot_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".fit.svg");
    PathBuf::from(name)
}

/// Values produced by a successful run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub dataset: Dataset,
    pub selection: Selection,
    pub model: DecayModel,
    pub fit: FitResult,
    pub report: Report,
}

/// Run the pipeline, writing the report to `out`.
pub fn run<W: Write>(config: &RunConfig, out: &mut W) -> Result<RunOutcome> {
    writeln!(out, "model: {}", config.model)?;

    let dataset = load_dataset(&config.input)
        .with_context(|| format!("failed to load {}", config.input.display()))?;
    info!(samples = dataset.len(), "dataset loaded");

    let m0 = dataset.first_mass();
    let model = DecayModel::new(config.model.resolve(), m0);

    let fit_range = match &config.fit_range {
        Some(text) => {
            writeln!(out, "selecting fit points with range: {text}")?;
            Some(FitRange::parse(text).context("invalid --fit-range")?)
        }
        None => None,
    };
    let selection = select(&dataset, fit_range.as_ref());
    info!(selected = selection.len(), "fit points selected");

    let fit = fit_curve(
        model,
        &selection.x,
        &selection.y,
        model.initial_guess(m0),
        config.lm.clone(),
    )
    .with_context(|| {
        format!(
            "failed to fit model {} to {} points",
            model.kind().number(),
            selection.len()
        )
    })?;

    let report = Report::compute(&model, &fit.params, dataset.last_mass());
    write!(out, "{report}")?;

    if config.ascii || config.plot.is_some() {
        let curve = fitted_curve(&dataset, &model, &fit.params);

        if config.ascii {
            write!(
                out,
                "{}",
                render_ascii_plot(&dataset, &curve, ASCII_SIZE.0, ASCII_SIZE.1)
            )?;
        }

        if let Some(path) = &config.plot {
            render_svg(path, &dataset, &curve)
                .with_context(|| format!("failed to write plot {}", path.display()))?;
            writeln!(out, "plot written to {}", path.display())?;
        }
    }

    if let Some(path) = &config.export {
        let export = FitExport::new(
            &config.input,
            &model,
            fit_range.as_ref(),
            dataset.len(),
            selection.len(),
            &fit,
            &report,
        );
        write_export_json(path, &export)
            .with_context(|| format!("failed to export {}", path.display()))?;
        info!(path = %path.display(), "fit exported");
    }

    Ok(RunOutcome {
        dataset,
        selection,
        model,
        fit,
        report,
    })
}
