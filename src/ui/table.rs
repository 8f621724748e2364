use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use incendios::data::Incident;

use crate::state::AppState;

const HEADERS: [&str; 10] = [
    "Date",
    "Region",
    "Province",
    "Municipality",
    "Area (ha)",
    "Cost (€)",
    "Loss (€)",
    "Lat",
    "Lng",
    "Cause",
];

fn optional(v: Option<f64>, decimals: usize) -> String {
    v.map(|x| format!("{x:.decimals$}")).unwrap_or_default()
}

fn cells(i: &Incident) -> [String; 10] {
    [
        i.date.to_string(),
        i.region.clone(),
        i.province.clone(),
        i.municipality.clone(),
        optional(i.burned_area, 2),
        optional(i.suppression_cost, 0),
        optional(i.economic_loss, 0),
        optional(i.latitude, 4),
        optional(i.longitude, 4),
        i.cause.clone().unwrap_or_default(),
    ]
}

/// The selected rows, newest first.
pub fn raw_table(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    let rows = &state.snapshot.rows;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(360.0)
        .columns(Column::auto().at_least(60.0), HEADERS.len() - 1)
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in HEADERS {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let Some(incident) = dataset.get(rows[row.index()]) else {
                    return;
                };
                for text in cells(incident) {
                    row.col(|ui| {
                        ui.label(text);
                    });
                }
            });
        });
}
