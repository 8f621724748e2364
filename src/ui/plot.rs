use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use incendios::data::Severity;

use crate::color::severity_color;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Incident map
// ---------------------------------------------------------------------------

/// Geolocated incidents as a longitude/latitude scatter, one series per
/// severity tier.
pub fn incident_map(ui: &mut Ui, state: &AppState) {
    let layer = &state.snapshot.map;
    ui.heading(format!(
        "Incident map: {} > {} > {}",
        state.params.region, state.params.province, state.params.municipality
    ));

    if layer.points.is_empty() {
        ui.label("No geolocated incidents for the current selection.");
        return;
    }
    if layer.is_sampled() {
        ui.label(
            RichText::new(format!(
                "Showing {} of {} geolocated incidents",
                layer.points.len(),
                layer.eligible
            ))
            .weak(),
        );
    }

    let (centre_lat, centre_lng) = layer.centre.unwrap_or_default();
    // Degrees of longitude either side of the centre.
    let half_span = if layer.zoom_hint >= 9 { 1.5 } else { 6.0 };

    Plot::new("incident_map")
        .legend(Legend::default())
        .data_aspect(1.0)
        .height(420.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .include_x(centre_lng - half_span)
        .include_x(centre_lng + half_span)
        .include_y(centre_lat)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for severity in Severity::ALL {
                let points: PlotPoints = layer
                    .points
                    .iter()
                    .filter(|p| p.severity == severity)
                    .map(|p| [p.longitude, p.latitude])
                    .collect();
                plot_ui.points(
                    Points::new(points)
                        .radius(3.0)
                        .color(severity_color(severity))
                        .name(severity.label()),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Yearly burned area
// ---------------------------------------------------------------------------

/// Burned hectares per year.
pub fn yearly_chart(ui: &mut Ui, state: &AppState) {
    ui.heading("Burned area per year");
    let yearly = &state.snapshot.aggregates.yearly;
    let points: PlotPoints = yearly.iter().map(|&(y, ha)| [y as f64, ha]).collect();

    Plot::new("yearly_plot")
        .height(280.0)
        .x_axis_label("Year")
        .y_axis_label("Hectares")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(points)
                    .name("Burned area")
                    .color(Color32::from_rgb(200, 60, 20))
                    .width(2.0),
            );
            plot_ui.points(
                Points::new(
                    yearly
                        .iter()
                        .map(|&(y, ha)| [y as f64, ha])
                        .collect::<PlotPoints>(),
                )
                .radius(3.0)
                .color(Color32::from_rgb(200, 60, 20)),
            );
        });
}

// ---------------------------------------------------------------------------
// Cause breakdown
// ---------------------------------------------------------------------------

/// Incident count per cause, most frequent at the top.
pub fn cause_chart(ui: &mut Ui, state: &AppState) {
    ui.heading("Causes");
    let causes = &state.snapshot.aggregates.causes;
    let has_causes = state.dataset.as_ref().is_some_and(|d| d.has_causes());
    if !has_causes {
        ui.label("No cause data available.");
        return;
    }

    let n = causes.len();
    let bars: Vec<Bar> = causes
        .iter()
        .enumerate()
        .map(|(i, (cause, count))| {
            let color = state
                .cause_colors
                .as_ref()
                .map(|cm| cm.color_for(cause))
                .unwrap_or(Color32::GRAY);
            Bar::new((n - i) as f64, *count as f64)
                .name(cause)
                .fill(color)
        })
        .collect();

    Plot::new("cause_plot")
        .height(280.0)
        .legend(Legend::default())
        .show_axes([true, false])
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().name("Incidents"));
        });
}
