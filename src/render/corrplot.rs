use std::f64::consts::PI;
use std::path::Path;

use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{prepare_output, rgb, FONT};
use crate::color::DivergingScale;
use crate::stats::correlation::CorrelationMatrix;

const ELLIPSE_STEPS: usize = 60;
const ELLIPSE_SCALE: f64 = 0.45;

/// Outline of the unit-variance bivariate-normal contour for correlation
/// `r`, centred on `center`. `r = 1` collapses onto the rising diagonal,
/// `r = -1` onto the falling one, `r = 0` is a circle.
pub fn ellipse_points(r: f64, center: (f64, f64)) -> Vec<(f64, f64)> {
    let d = r.clamp(-1.0, 1.0).acos();
    (0..ELLIPSE_STEPS)
        .map(|i| {
            let t = 2.0 * PI * i as f64 / ELLIPSE_STEPS as f64;
            (
                center.0 + ELLIPSE_SCALE * (t + d / 2.0).cos(),
                center.1 + ELLIPSE_SCALE * (t - d / 2.0).cos(),
            )
        })
        .collect()
}

/// Ellipse-encoded correlation matrix: tilt gives the sign, narrowness the
/// strength, fill the diverging colour. Undefined cells stay empty.
pub fn render_correlation(path: &Path, title: &str, matrix: &CorrelationMatrix) -> Result<()> {
    prepare_output(path)?;
    let k = matrix.variables.len().max(1) as f64;
    let scale = DivergingScale { limit: 1.0 };

    let root = SVGBackend::new(path, (760, 720)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 22))
        .margin(10)
        .build_cartesian_2d(-1.6..k, 0.0..k + 0.8)?;

    let centred = TextStyle::from((FONT, 14)).pos(Pos::new(HPos::Center, VPos::Center));
    let right = TextStyle::from((FONT, 14)).pos(Pos::new(HPos::Right, VPos::Center));

    for (i, var) in matrix.variables.iter().enumerate() {
        let row_y = k - i as f64 - 0.5;
        chart.draw_series(std::iter::once(Text::new(
            var.label().to_string(),
            (-0.1, row_y),
            right.clone(),
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            var.label().to_string(),
            (i as f64 + 0.5, k + 0.35),
            centred.clone(),
        )))?;
    }

    for (i, row) in matrix.values.iter().enumerate() {
        for (j, &r) in row.iter().enumerate() {
            let x0 = j as f64;
            let y0 = k - i as f64 - 1.0;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x0, y0), (x0 + 1.0, y0 + 1.0)],
                BLACK.mix(0.2),
            )))?;
            if r.is_nan() {
                continue;
            }
            let outline = ellipse_points(r, (x0 + 0.5, y0 + 0.5));
            let fill = rgb(scale.color_for(r));
            chart.draw_series(std::iter::once(Polygon::new(outline.clone(), fill.filled())))?;
            let mut closed = outline;
            if let Some(&first) = closed.first() {
                closed.push(first);
            }
            chart.draw_series(std::iter::once(PathElement::new(closed, BLACK.mix(0.6))))?;
        }
    }

    root.present()?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
