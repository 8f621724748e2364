mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use app::IncendiosApp;
use eframe::egui;
use incendios::config::{DashboardConfig, DEFAULT_CONFIG_FILE};
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let (config, config_error) = match DashboardConfig::load(&config_path) {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("{e:#}");
            (DashboardConfig::default(), Some(format!("{e:#}")))
        }
    };

    let mut state = AppState::new(config);
    state.load_configured();
    if let Some(msg) = config_error {
        state.status_message = Some(msg);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Incendios – Spanish Wildfire Monitor",
        options,
        Box::new(|_cc| Ok(Box::new(IncendiosApp::new(state)))),
    )
}
