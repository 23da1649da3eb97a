use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::color::to_color32;
use crate::state::MapState;

// ---------------------------------------------------------------------------
// Left side panel – year filter, legend, model summaries
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut MapState) {
    ui.heading("Residuals: height ~ elevation");
    ui.separator();

    let years = state.years.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Year filter ----
            let header = format!("Sample year  ({}/{})", state.visible_years.len(), years.len());
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("years")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_none();
                        }
                    });

                    for year in &years {
                        let mut checked = state.visible_years.contains(year);
                        if ui.checkbox(&mut checked, year.to_string()).changed() {
                            state.toggle_year(*year);
                        }
                    }
                });
            ui.separator();

            // ---- Legend swatches ----
            egui::CollapsingHeader::new(RichText::new("Residual scale").strong())
                .id_salt("scale")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    for (label, color) in state.bins.legend_entries() {
                        ui.label(RichText::new(format!("●  {label}")).color(to_color32(color)));
                    }
                });
            ui.separator();

            // ---- Model summaries ----
            egui::CollapsingHeader::new(RichText::new("Model summaries").strong())
                .id_salt("summaries")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    ui.monospace(&state.summary_text);
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut MapState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("View", |ui: &mut Ui| {
            if ui.button("Reset view").clicked() {
                state.reset_view();
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} plots, {} visible",
            state.points.len(),
            state.visible_indices.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}
