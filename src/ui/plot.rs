use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotBounds, PlotPoints, Points};

use crate::color::to_color32;
use crate::config::MAP_CENTER;
use crate::state::{initial_bounds, MapState};

// ---------------------------------------------------------------------------
// Residual map (central panel)
// ---------------------------------------------------------------------------

/// Render the interactive residual map in the central panel.
///
/// Pan, zoom and the legend come from `egui_plot`; this only binds data to
/// markers and applies the initial viewport once.
pub fn residual_map(ui: &mut Ui, state: &mut MapState) {
    let size = ui.available_size();
    let apply_viewport = state.viewport_pending;
    state.viewport_pending = false;

    // Screen width of a degree of longitude relative to one of latitude.
    let aspect = (1.0 / MAP_CENTER[1].to_radians().cos()) as f32;

    Plot::new("residual_map")
        .legend(Legend::default())
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .data_aspect(aspect)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            if apply_viewport {
                let (min, max) = initial_bounds(size.x as f64, size.y as f64);
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(min, max));
            }

            for ring in &state.region.rings {
                let outline: PlotPoints = ring.iter().copied().collect();
                plot_ui.line(
                    Line::new(outline)
                        .name(&state.region.name)
                        .color(Color32::DARK_GRAY)
                        .width(1.5),
                );
            }

            for (label, color, coords) in state.binned_points() {
                let points = Points::new(PlotPoints::from(coords))
                    .name(label)
                    .color(to_color32(color))
                    .shape(MarkerShape::Circle)
                    .filled(true)
                    .radius(4.0);
                plot_ui.points(points);
            }
        });
}
