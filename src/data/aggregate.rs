use std::collections::{BTreeMap, HashMap};

use super::filter::Selection;
use super::model::Incident;

/// Headline numbers and chart series for a selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    pub count: usize,
    /// Hectares.
    pub burned_area: f64,
    pub suppression_cost: f64,
    pub economic_loss: f64,
    /// `(year, burned hectares)`, ascending and gap-free between the first
    /// and last selected year.
    pub yearly: Vec<(i32, f64)>,
    /// `(cause, incidents)`, most frequent first.
    pub causes: Vec<(String, usize)>,
}

impl Aggregates {
    pub fn compute(selection: &Selection<'_>) -> Self {
        Aggregates {
            count: selection.len(),
            burned_area: sum(selection, |i| i.burned_area),
            suppression_cost: sum(selection, |i| i.suppression_cost),
            economic_loss: sum(selection, |i| i.economic_loss),
            yearly: yearly_burned_area(selection),
            causes: cause_frequency(selection),
        }
    }
}

/// Sum a numeric field; missing values count as zero.
pub fn sum(selection: &Selection<'_>, field: impl Fn(&Incident) -> Option<f64>) -> f64 {
    selection.iter().filter_map(field).sum()
}

/// Burned area per calendar year. Years between the first and last selected
/// year with no incidents appear with `0.0`.
pub fn yearly_burned_area(selection: &Selection<'_>) -> Vec<(i32, f64)> {
    let mut per_year: BTreeMap<i32, f64> = BTreeMap::new();
    for incident in selection.iter() {
        *per_year.entry(incident.year()).or_default() += incident.burned_area.unwrap_or(0.0);
    }
    let (Some(&first), Some(&last)) = (per_year.keys().next(), per_year.keys().next_back()) else {
        return Vec::new();
    };
    (first..=last)
        .map(|year| (year, per_year.get(&year).copied().unwrap_or(0.0)))
        .collect()
}

/// Incident count per cause, descending; ties ordered by name.
pub fn cause_frequency(selection: &Selection<'_>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for cause in selection.iter().filter_map(|i| i.cause.as_deref()) {
        *counts.entry(cause).or_default() += 1;
    }
    let mut causes: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(c, n)| (c.to_string(), n))
        .collect();
    causes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    causes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filter, FilterParams};
    use crate::data::model::tests::incident;
    use crate::data::model::NormalizedTable;

    #[test]
    fn single_year_scenario() {
        let table = NormalizedTable::new(
            vec![
                incident("2020-05-01", "1", "10", Some(5.0)),
                incident("2021-05-01", "1", "10", Some(60.0)),
            ],
            "t.csv",
        );
        let view = filter(
            &table,
            &FilterParams {
                years: (2020, 2020),
                ..FilterParams::default()
            },
        );
        assert_eq!(view.aggregates.count, 1);
        assert_eq!(view.aggregates.burned_area, 5.0);
        assert_eq!(view.aggregates.yearly, vec![(2020, 5.0)]);
    }

    #[test]
    fn missing_values_sum_as_zero() {
        let mut rows = vec![
            incident("2020-05-01", "1", "10", Some(5.0)),
            incident("2020-06-01", "1", "10", None),
            incident("2020-07-01", "1", "10", Some(2.5)),
        ];
        rows[0].suppression_cost = Some(100.0);
        rows[2].economic_loss = Some(7.0);
        let table = NormalizedTable::new(rows, "t.csv");
        let agg = Aggregates::compute(&Selection::all(&table));

        assert_eq!(agg.burned_area, 7.5);
        assert!(agg.burned_area.is_finite());
        assert_eq!(agg.suppression_cost, 100.0);
        assert_eq!(agg.economic_loss, 7.0);
        assert_eq!(agg.yearly, vec![(2020, 7.5)]);
    }

    #[test]
    fn yearly_fills_gap_years() {
        let table = NormalizedTable::new(
            vec![
                incident("2018-05-01", "1", "10", Some(1.0)),
                incident("2020-05-01", "1", "10", Some(2.0)),
                incident("2020-09-01", "1", "10", Some(3.0)),
            ],
            "t.csv",
        );
        let yearly = yearly_burned_area(&Selection::all(&table));
        assert_eq!(yearly, vec![(2018, 1.0), (2019, 0.0), (2020, 5.0)]);
    }

    #[test]
    fn empty_selection_has_empty_series() {
        let table = NormalizedTable::default();
        let agg = Aggregates::compute(&Selection::all(&table));
        assert_eq!(agg, Aggregates::default());
    }

    #[test]
    fn causes_sorted_by_count_then_name() {
        let mut rows: Vec<_> = (0..6)
            .map(|_| incident("2020-05-01", "1", "10", None))
            .collect();
        let labels = ["Rayo", "Negligencia", "Rayo", "Intencionado", "Negligencia", "Rayo"];
        for (row, label) in rows.iter_mut().zip(labels) {
            row.cause = Some(label.to_string());
        }
        let table = NormalizedTable::new(rows, "t.csv");
        let causes = cause_frequency(&Selection::all(&table));
        assert_eq!(
            causes,
            vec![
                ("Rayo".to_string(), 3),
                ("Negligencia".to_string(), 2),
                ("Intencionado".to_string(), 1),
            ]
        );
    }

    #[test]
    fn kpi_matches_manual_sum() {
        let table = NormalizedTable::new(
            vec![
                incident("2020-05-01", "1", "10", Some(1.25)),
                incident("2020-05-02", "2", "20", None),
                incident("2021-05-03", "1", "11", Some(4.0)),
            ],
            "t.csv",
        );
        let params = FilterParams::full_range(&table);
        let view = filter(&table, &params);
        let manual: f64 = view
            .selection
            .iter()
            .map(|i| i.burned_area.unwrap_or(0.0))
            .sum();
        assert_eq!(view.aggregates.burned_area, manual);
    }
}
