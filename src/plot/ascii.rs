//! Terminal plot of the drying curve.
//!
//! Fixed-size character grid, deterministic for a given input:
//! - measured samples: `x`
//! - fitted curve: `-`

use super::{finite_bounds, pad_range};
use crate::data::Dataset;

/// Render the samples of `dataset` over the sampled `curve`.
///
/// The time axis spans both the samples and the curve; the mass axis is padded
/// by 5% so extreme points stay off the border.
pub fn render_ascii_plot(
    dataset: &Dataset,
    curve: &[(f64, f64)],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let times = dataset.x().iter().copied().chain(curve.iter().map(|p| p.0));
    let (t_min, t_max) = match finite_bounds(times) {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, hi)) => pad_range(lo, hi, 0.0),
        None => (0.0, 1.0),
    };

    let masses = dataset.y().iter().copied().chain(curve.iter().map(|p| p.1));
    let (m_min, m_max) = finite_bounds(masses).unwrap_or((0.0, 1.0));
    let (m_min, m_max) = pad_range(m_min, m_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curve first so samples overlay it
    draw_curve(&mut grid, curve, (t_min, t_max), (m_min, m_max));

    for sample in dataset.samples() {
        if !sample.time.is_finite() || !sample.mass.is_finite() {
            continue;
        }
        let col = map_x(sample.time, t_min, t_max, width);
        let row = map_y(sample.mass, m_min, m_max, height);
        grid[row][col] = 'x';
    }

    let mut out = format!(
        "Plot: t=[{t_min:.3}, {t_max:.3}] h | mass=[{m_min:.2}, {m_max:.2}] g\n"
    );
    for row in grid {
        out.extend(row);
        out.push('\n');
    }
    out
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(m: f64, m_min: f64, m_max: f64, height: usize) -> usize {
    let u = ((m - m_min) / (m_max - m_min)).clamp(0.0, 1.0);
    // Largest mass on row 0
    (height as f64 - 1.0 - u * (height as f64 - 1.0)).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], t: (f64, f64), m: (f64, f64)) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(time, mass) in curve {
        if !time.is_finite() || !mass.is_finite() {
            prev = None;
            continue;
        }
        let col = map_x(time, t.0, t.1, width);
        let row = map_y(mass, m.0, m.1, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, (c0, r0), (col, row), '-'),
            None => grid[row][col] = '-',
        }
        prev = Some((col, row));
    }
}

/// Bresenham line between two grid cells, leaving occupied cells alone.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x0, mut y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y0 as usize)
            .and_then(|row| row.get_mut(x0 as usize))
        {
            if *cell == ' ' {
                *cell = ch;
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
