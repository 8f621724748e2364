use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use incendios::data::{NormalizedTable, Severity};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Map marker fill for a severity tier.
pub fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Severe => Color32::from_rgb(139, 0, 0),
        Severity::Moderate => Color32::from_rgb(255, 165, 0),
        Severity::Minor => Color32::from_rgb(255, 215, 0),
    }
}

// ---------------------------------------------------------------------------
// Color mapping: cause label → Color32
// ---------------------------------------------------------------------------

/// Maps each cause of a dataset to a stable colour, so the chart keeps its
/// colours while the filters change.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn for_causes(table: &NormalizedTable) -> Self {
        let causes: BTreeSet<&str> = table
            .incidents()
            .iter()
            .filter_map(|i| i.cause.as_deref())
            .collect();
        let palette = generate_palette(causes.len());
        let mapping = causes
            .into_iter()
            .zip(palette)
            .map(|(c, color)| (c.to_string(), color))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given cause.
    pub fn color_for(&self, cause: &str) -> Color32 {
        self.mapping
            .get(cause)
            .copied()
            .unwrap_or(self.default_color)
    }
}
