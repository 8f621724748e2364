use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct IncendiosApp {
    pub state: AppState,
}

impl IncendiosApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for IncendiosApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: dashboard ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard(ui, &self.state);
        });
    }
}

fn dashboard(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            let text = state
                .status_message
                .as_deref()
                .unwrap_or("Open an incident archive to begin  (File → Open archive…)");
            ui.heading(text);
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Wildfires in Spain");
            let (start, end) = state.params.years;
            ui.label(RichText::new(format!("Showing {start} to {end}")).weak());
            ui.add_space(6.0);

            panels::kpi_row(ui, state);
            ui.separator();

            plot::incident_map(ui, state);
            ui.separator();

            ui.columns(2, |cols| {
                plot::yearly_chart(&mut cols[0], state);
                plot::cause_chart(&mut cols[1], state);
            });
            ui.separator();

            egui::CollapsingHeader::new("Raw data")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    table::raw_table(ui, state);
                });
        });
}
