use eframe::egui;

use crate::state::MapState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ResidualMapApp {
    pub state: MapState,
}

impl ResidualMapApp {
    pub fn new(state: MapState) -> Self {
        Self { state }
    }
}

impl eframe::App for ResidualMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters, legend, summaries ----
        egui::SidePanel::left("side_panel")
            .default_width(320.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: map ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::residual_map(ui, &mut self.state);
        });
    }
}
