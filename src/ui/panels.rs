use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use incendios::data::{Choice, Level};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };
    let Some((first, last)) = dataset.year_bounds() else {
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Year range ----
            ui.strong("Years");
            let (mut start, mut end) = state.params.years;
            ui.add(egui::Slider::new(&mut start, first..=last).text("from"));
            ui.add(egui::Slider::new(&mut end, first..=last).text("to"));
            if end < start {
                std::mem::swap(&mut start, &mut end);
            }
            state.set_years(start, end);
            ui.separator();

            // ---- Geographic cascade ----
            for level in Level::ALL {
                level_combo(ui, state, level);
            }

            ui.separator();
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

/// One cascade level: "All" plus the options left by the coarser levels.
fn level_combo(ui: &mut Ui, state: &mut AppState, level: Level) {
    let current = state.params.choice(level).clone();
    let options = state.snapshot.options(level).to_vec();
    let mut picked: Option<Choice> = None;

    ui.strong(level.label());
    egui::ComboBox::from_id_salt(level.label())
        .selected_text(current.to_string())
        .width(ui.available_width() - 8.0)
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_all(), "All").clicked() {
                picked = Some(Choice::All);
            }
            for option in &options {
                let selected = current.admits(option) && !current.is_all();
                if ui.selectable_label(selected, option).clicked() {
                    picked = Some(Choice::only(option.clone()));
                }
            }
        });
    ui.add_space(4.0);

    if let Some(choice) = picked {
        state.select(level, choice);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open archive…").clicked() {
                open_archive_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open lookup…").clicked() {
                open_lookup_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} incidents loaded, {} selected",
                ds.len(),
                state.snapshot.rows.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// KPI row
// ---------------------------------------------------------------------------

/// The four headline numbers for the current selection.
pub fn kpi_row(ui: &mut Ui, state: &AppState) {
    let agg = &state.snapshot.aggregates;
    let kpis = [
        ("Total fires", group_thousands(agg.count as f64, 0)),
        ("Burned area (ha)", group_thousands(agg.burned_area, 2)),
        ("Suppression cost (€)", group_thousands(agg.suppression_cost, 0)),
        ("Economic loss (€)", group_thousands(agg.economic_loss, 0)),
    ];
    ui.columns(kpis.len(), |cols| {
        for (col, (label, value)) in cols.iter_mut().zip(kpis) {
            col.vertical(|ui| {
                ui.label(label);
                ui.label(RichText::new(value).size(22.0).strong());
            });
        }
    });
}

/// `1234567.891` → `"1,234,567.89"` for `decimals = 2`.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_archive_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open incident archive")
        .add_filter("Zip archive", &["zip"])
        .pick_file();

    if let Some(path) = file {
        let lookup = state.config.lookup.clone();
        state.load(path, lookup);
    }
}

pub fn open_lookup_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open lookup workbook")
        .add_filter("Workbook", &["xlsx", "xls", "xlsb", "ods", "csv"])
        .pick_file();

    if let Some(path) = file {
        let archive: PathBuf = state.config.archive.clone();
        state.load(archive, Some(path));
    }
}
