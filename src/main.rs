mod app;
mod color;
mod config;
mod data;
mod geo;
mod render;
mod report;
mod state;
mod stats;
mod ui;

use anyhow::anyhow;
use app::ResidualMapApp;
use config::ReportConfig;
use eframe::egui;
use state::MapState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ReportConfig::default();
    let report = report::run(&config)?;
    print!("{}", report.summary_text);
    log::info!("Report written to {}", config.output_dir.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    let state = MapState::from_report(&report);
    eframe::run_native(
        "Oregon plots – height ~ elevation residuals",
        options,
        Box::new(|_cc| Ok(Box::new(ResidualMapApp::new(state)))),
    )
    .map_err(|e| anyhow!("interactive map failed: {e}"))
}
