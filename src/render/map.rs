use std::path::Path;

use anyhow::Result;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use serde::Serialize;

use super::{prepare_output, rgb, FONT};
use crate::color::{DivergingScale, ResidualBins};
use crate::geo::{Bounds, Region};

/// A regression residual re-attached to its plot location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResidualPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub year: i64,
    pub residual: f64,
}

/// Region outline plus any points, padded. Points off the outline widen
/// the extent instead of being clipped.
fn map_extent(region: &Region, points: impl Iterator<Item = [f64; 2]>) -> Bounds {
    let outline = region.bounds();
    let mut bounds = outline.unwrap_or(Bounds {
        min: [-125.0, 41.5],
        max: [-116.0, 46.5],
    });
    let mut outside = 0usize;
    for p in points {
        if outline.is_some_and(|o| !o.contains(p)) {
            outside += 1;
        }
        bounds.include(p);
    }
    if outside > 0 {
        log::warn!("{outside} point(s) fall outside the {} outline", region.name);
    }
    bounds.padded(0.04)
}

fn draw_outline(
    chart: &mut ChartContext<'_, SVGBackend<'_>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    region: &Region,
) -> Result<()> {
    for ring in &region.rings {
        let path: Vec<(f64, f64)> = ring.iter().map(|p| (p[0], p[1])).collect();
        chart.draw_series(std::iter::once(PathElement::new(path, BLACK.stroke_width(1))))?;
    }
    Ok(())
}

/// Outline map of the plot locations.
pub fn render_locations(path: &Path, region: &Region, locations: &[[f64; 2]]) -> Result<()> {
    prepare_output(path)?;
    let b = map_extent(region, locations.iter().copied());

    let root = SVGBackend::new(path, (900, 720)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} plot locations (n = {})", region.name, locations.len()), (FONT, 22))
        .margin(10)
        .x_label_area_size(36)
        .y_label_area_size(48)
        .build_cartesian_2d(b.min[0]..b.max[0], b.min[1]..b.max[1])?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("longitude")
        .y_desc("latitude")
        .draw()?;

    draw_outline(&mut chart, region)?;
    chart.draw_series(
        locations
            .iter()
            .map(|p| Circle::new((p[0], p[1]), 2, RGBColor(34, 139, 34).mix(0.7).filled())),
    )?;

    root.present()?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Static residual map: outline plus points coloured on a diverging scale
/// centred at zero, with a binned legend.
pub fn render_residual_map(
    path: &Path,
    title: &str,
    region: &Region,
    points: &[ResidualPoint],
    bin_count: usize,
) -> Result<()> {
    prepare_output(path)?;
    let b = map_extent(region, points.iter().map(|p| [p.longitude, p.latitude]));
    let residuals: Vec<f64> = points.iter().map(|p| p.residual).collect();
    let bins = ResidualBins::new(DivergingScale::symmetric(&residuals), bin_count);

    let root = SVGBackend::new(path, (960, 720)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 22))
        .margin(10)
        .x_label_area_size(36)
        .y_label_area_size(48)
        .build_cartesian_2d(b.min[0]..b.max[0], b.min[1]..b.max[1])?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("longitude")
        .y_desc("latitude")
        .draw()?;

    draw_outline(&mut chart, region)?;

    for bin in 0..bins.len() {
        let members: Vec<(f64, f64)> = points
            .iter()
            .filter(|p| p.residual.is_finite() && bins.bin_of(p.residual) == bin)
            .map(|p| (p.longitude, p.latitude))
            .collect();
        if members.is_empty() {
            continue;
        }
        let color = rgb(bins.color(bin));
        chart
            .draw_series(members.into_iter().flat_map(|p| {
                [
                    Circle::new(p, 4, color.filled()),
                    Circle::new(p, 4, BLACK.mix(0.4).stroke_width(1)),
                ]
            }))?
            .label(bins.label(bin))
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
