//! SVG rendering of the drying curve with plotters.

use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use super::{finite_bounds, pad_range};
use crate::data::Dataset;
use crate::error::{DryFitError, Result};

const SIZE: (u32, u32) = (1024, 640);

fn plot_err<E: std::fmt::Display>(err: E) -> DryFitError {
    DryFitError::Plot(err.to_string())
}

/// Draw the samples as red crosses and `curve` as a blue line into an SVG at `path`.
pub fn render_svg(path: &Path, dataset: &Dataset, curve: &[(f64, f64)]) -> Result<()> {
    let times = dataset.x().iter().copied().chain(curve.iter().map(|p| p.0));
    let (t_min, t_max) = match finite_bounds(times) {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, hi)) => pad_range(lo, hi, 0.0),
        None => (0.0, 1.0),
    };

    let masses = dataset.y().iter().copied().chain(curve.iter().map(|p| p.1));
    let (m_min, m_max) = finite_bounds(masses).unwrap_or((0.0, 1.0));
    let (m_min, m_max) = pad_range(m_min, m_max, 0.05);

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Drying curve", ("sans-serif", 24))
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(t_min..t_max, m_min..m_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("time (h)")
        .y_desc("mass (g)")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.1}", v))
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(
            curve
                .iter()
                .copied()
                .filter(|(t, m)| t.is_finite() && m.is_finite()),
            BLUE.stroke_width(2),
        ))
        .map_err(plot_err)?
        .label("fit")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    chart
        .draw_series(
            dataset
                .samples()
                .map(|s| Cross::new((s.time, s.mass), 5, RED.stroke_width(2))),
        )
        .map_err(plot_err)?
        .label("data")
        .legend(|(x, y)| Cross::new((x + 10, y), 5, RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    info!(path = %path.display(), "plot written");
    Ok(())
}
