use std::path::Path;

use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{padded_range, prepare_output, FONT};
use crate::data::model::NumericColumn;

const CELL_PX: u32 = 180;

/// All-pairs scatter matrix. The diagonal carries the variable names; each
/// off-diagonal cell plots the rows where both columns are present.
pub fn render_scatter_matrix(path: &Path, title: &str, columns: &[NumericColumn]) -> Result<()> {
    prepare_output(path)?;
    let k = columns.len().max(1);
    let size = CELL_PX * k as u32;

    let root = SVGBackend::new(path, (size, size + 40)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, (FONT, 22))?;
    let cells = root.split_evenly((k, k));

    let ranges: Vec<(f64, f64)> = columns
        .iter()
        .map(|c| padded_range(c.values.iter().flatten().copied(), 0.05))
        .collect();

    for (idx, cell) in cells.iter().enumerate() {
        let (row, col) = (idx / k, idx % k);
        let (Some(y_col), Some(x_col)) = (columns.get(row), columns.get(col)) else {
            continue;
        };
        let (w, h) = cell.dim_in_pixel();
        cell.draw(&Rectangle::new(
            [(0, 0), (w as i32 - 1, h as i32 - 1)],
            BLACK.mix(0.3),
        ))?;

        if row == col {
            let style = TextStyle::from((FONT, 18))
                .pos(Pos::new(HPos::Center, VPos::Center));
            cell.draw(&Text::new(
                x_col.variable.label().to_string(),
                (w as i32 / 2, h as i32 / 2),
                style,
            ))?;
            continue;
        }

        let (x0, x1) = ranges[col];
        let (y0, y1) = ranges[row];
        let mut chart = ChartBuilder::on(cell).margin(6).build_cartesian_2d(x0..x1, y0..y1)?;

        let points = x_col
            .values
            .iter()
            .zip(&y_col.values)
            .filter_map(|(x, y)| Some(((*x)?, (*y)?)));
        chart.draw_series(points.map(|p| Circle::new(p, 1, BLUE.mix(0.5).filled())))?;
    }

    root.present()?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
