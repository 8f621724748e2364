use super::filter::FilteredView;
use super::model::Incident;

/// Severity tier of an incident, by burned hectares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Up to 10 ha, or unknown.
    Minor,
    /// Over 10 ha.
    Moderate,
    /// Over 50 ha.
    Severe,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Minor, Severity::Moderate, Severity::Severe];

    pub fn from_burned_area(hectares: Option<f64>) -> Self {
        match hectares {
            Some(h) if h > 50.0 => Severity::Severe,
            Some(h) if h > 10.0 => Severity::Moderate,
            _ => Severity::Minor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Minor => "≤ 10 ha",
            Severity::Moderate => "10–50 ha",
            Severity::Severe => "> 50 ha",
        }
    }
}

/// One plottable incident.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPoint {
    /// Row index into the base table.
    pub row: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: Severity,
}

/// The map-oriented subset of a filtered view.
///
/// Only rows with both coordinates are eligible; this never feeds back into
/// the view's counts or aggregates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapLayer {
    pub points: Vec<MapPoint>,
    /// Eligible rows before the point cap.
    pub eligible: usize,
    /// Mean latitude/longitude of the eligible rows.
    pub centre: Option<(f64, f64)>,
    pub zoom_hint: u8,
}

impl MapLayer {
    pub fn build(view: &FilteredView<'_>, max_points: usize) -> Self {
        let incidents = view.selection.table().incidents();
        let eligible: Vec<usize> = view
            .selection
            .indices()
            .iter()
            .copied()
            .filter(|&i| incidents[i].coordinates().is_some())
            .collect();

        let centre = (!eligible.is_empty()).then(|| {
            let n = eligible.len() as f64;
            let (lat, lng) = eligible.iter().fold((0.0, 0.0), |(lat, lng), &i| {
                let (a, b) = incidents[i].coordinates().unwrap_or_default();
                (lat + a, lng + b)
            });
            (lat / n, lng / n)
        });

        let points = stride_sample(&eligible, max_points)
            .into_iter()
            .filter_map(|row| point(row, &incidents[row]))
            .collect();

        MapLayer {
            points,
            eligible: eligible.len(),
            centre,
            zoom_hint: if view.params.region.is_all() { 6 } else { 9 },
        }
    }

    /// Whether the cap dropped any eligible rows.
    pub fn is_sampled(&self) -> bool {
        self.points.len() < self.eligible
    }
}

fn point(row: usize, incident: &Incident) -> Option<MapPoint> {
    let (latitude, longitude) = incident.coordinates()?;
    Some(MapPoint {
        row,
        latitude,
        longitude,
        severity: Severity::from_burned_area(incident.burned_area),
    })
}

/// At most `max` items taken at an even stride across the whole slice, so
/// the tail is represented as well as the head.
pub fn stride_sample<T: Copy>(items: &[T], max: usize) -> Vec<T> {
    if items.len() <= max {
        return items.to_vec();
    }
    if max == 0 {
        return Vec::new();
    }
    let step = items.len() as f64 / max as f64;
    (0..max)
        .map(|k| items[((k as f64 * step) as usize).min(items.len() - 1)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::Aggregates;
    use crate::data::filter::{filter, FilterParams, Selection};
    use crate::data::model::tests::incident;
    use crate::data::model::{Choice, NormalizedTable};

    fn table() -> NormalizedTable {
        let mut rows = vec![
            incident("2020-05-01", "Galicia", "Ourense", Some(60.0)),
            incident("2020-05-02", "Galicia", "Ourense", Some(20.0)),
            incident("2020-05-03", "Galicia", "Lugo", None),
            incident("2020-05-04", "Asturias", "Oviedo", Some(1.0)),
        ];
        rows[0].latitude = Some(42.0);
        rows[0].longitude = Some(-8.0);
        rows[1].latitude = Some(43.0);
        rows[1].longitude = Some(-7.0);
        rows[2].latitude = Some(44.0);
        rows[3].latitude = Some(43.3);
        rows[3].longitude = Some(-5.8);
        rows[3].cause = Some("Rayo".to_string());
        NormalizedTable::new(rows, "t.csv")
    }

    #[test]
    fn severity_tiers() {
        assert_eq!(Severity::from_burned_area(Some(50.1)), Severity::Severe);
        assert_eq!(Severity::from_burned_area(Some(50.0)), Severity::Moderate);
        assert_eq!(Severity::from_burned_area(Some(10.5)), Severity::Moderate);
        assert_eq!(Severity::from_burned_area(Some(10.0)), Severity::Minor);
        assert_eq!(Severity::from_burned_area(None), Severity::Minor);
    }

    #[test]
    fn only_rows_with_both_coordinates_are_plotted() {
        let t = table();
        let view = filter(&t, &FilterParams::full_range(&t));
        let layer = MapLayer::build(&view, 100);
        let rows: Vec<usize> = layer.points.iter().map(|p| p.row).collect();
        assert_eq!(rows, vec![0, 1, 3]);
        assert_eq!(layer.points[0].severity, Severity::Severe);
        assert_eq!(layer.points[1].severity, Severity::Moderate);
        assert_eq!(layer.zoom_hint, 6);
        assert!(!layer.is_sampled());
    }

    #[test]
    fn coordinate_exclusion_leaves_aggregates_alone() {
        let t = table();
        let view = filter(&t, &FilterParams::full_range(&t));
        let _layer = MapLayer::build(&view, 1);
        assert_eq!(view.aggregates.count, 4);
        assert_eq!(view.aggregates.burned_area, 81.0);
        assert_eq!(view.aggregates, Aggregates::compute(&Selection::all(&t)));
    }

    #[test]
    fn centre_and_zoom_follow_region_choice() {
        let t = table();
        let mut params = FilterParams::full_range(&t);
        params.region = Choice::only("Galicia");
        let layer = MapLayer::build(&filter(&t, &params), 100);
        assert_eq!(layer.eligible, 2);
        assert_eq!(layer.centre, Some((42.5, -7.5)));
        assert_eq!(layer.zoom_hint, 9);
    }

    #[test]
    fn no_coordinates_means_no_centre() {
        let t = table();
        let mut params = FilterParams::full_range(&t);
        params.province = Choice::only("Lugo");
        let layer = MapLayer::build(&filter(&t, &params), 100);
        assert!(layer.points.is_empty());
        assert_eq!(layer.centre, None);
    }

    #[test]
    fn stride_sample_spans_the_whole_slice() {
        let items: Vec<usize> = (0..1000).collect();
        let sample = stride_sample(&items, 10);
        assert_eq!(sample.len(), 10);
        assert_eq!(sample[0], 0);
        assert!(*sample.last().unwrap() >= 900);
        assert_eq!(stride_sample(&items[..5], 10), vec![0, 1, 2, 3, 4]);
        assert!(stride_sample(&items, 0).is_empty());
    }

    #[test]
    fn capped_layer_reports_sampling() {
        let t = table();
        let view = filter(&t, &FilterParams::full_range(&t));
        let layer = MapLayer::build(&view, 2);
        assert_eq!(layer.points.len(), 2);
        assert_eq!(layer.eligible, 3);
        assert!(layer.is_sampled());
    }
}
