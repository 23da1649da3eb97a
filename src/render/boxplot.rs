use std::path::Path;

use anyhow::Result;
use plotters::prelude::*;

use super::{padded_range, prepare_output, rgb, FONT};
use crate::color::generate_palette;
use crate::data::model::{PlotRecord, Variable};

const GROUP_LABELS: [&str; 2] = ["unburned", "burned"];

/// One facet per variable, one box per burned group.
pub fn render_group_boxplots(path: &Path, records: &[PlotRecord], vars: &[Variable]) -> Result<()> {
    prepare_output(path)?;
    let facets = vars.len().max(1);
    let cols = facets.min(3);
    let rows = facets.div_ceil(cols);

    let root = SVGBackend::new(path, (320 * cols as u32, 320 * rows as u32 + 40)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("Distributions by burn status", (FONT, 22))?;
    let panels = root.split_evenly((rows, cols));
    let palette = generate_palette(2);

    for (panel, &var) in panels.iter().zip(vars) {
        let groups: [Vec<f64>; 2] = [false, true].map(|burned| {
            records
                .iter()
                .filter(|r| r.burned == burned)
                .map(|r| r.value(var))
                .collect()
        });

        let (lo, hi) = padded_range(groups.iter().flatten().copied(), 0.05);
        let mut chart = ChartBuilder::on(panel)
            .caption(var.label(), (FONT, 16))
            .margin(8)
            .x_label_area_size(24)
            .y_label_area_size(56)
            .build_cartesian_2d((0i32..2).into_segmented(), lo as f32..hi as f32)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                    GROUP_LABELS.get(*i as usize).copied().unwrap_or("").to_string()
                }
                SegmentValue::Last => String::new(),
            })
            .draw()?;

        for (i, values) in groups.iter().enumerate() {
            if values.is_empty() {
                continue;
            }
            let quartiles = Quartiles::new(values.as_slice());
            let color = rgb(palette[i]);
            chart.draw_series(std::iter::once(
                Boxplot::new_vertical(SegmentValue::CenterOf(i as i32), &quartiles)
                    .width(40)
                    .style(&color),
            ))?;
        }
    }

    root.present()?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
