use std::collections::BTreeSet;

use super::aggregate::Aggregates;
use super::model::{Choice, Incident, NormalizedTable};

// ---------------------------------------------------------------------------
// Selection: an immutable subset of the base table
// ---------------------------------------------------------------------------

/// Row indices into a [`NormalizedTable`]. Narrowing always produces a new
/// selection; the table itself is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    table: &'a NormalizedTable,
    rows: Vec<usize>,
}

impl<'a> Selection<'a> {
    /// Every row of `table`.
    pub fn all(table: &'a NormalizedTable) -> Self {
        Selection {
            table,
            rows: (0..table.len()).collect(),
        }
    }

    pub fn table(&self) -> &'a NormalizedTable {
        self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Incident> + '_ {
        let incidents = self.table.incidents();
        self.rows.iter().map(move |&i| &incidents[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep the rows for which `keep` holds.
    pub fn narrow(&self, keep: impl Fn(&Incident) -> bool) -> Selection<'a> {
        let incidents = self.table.incidents();
        Selection {
            table: self.table,
            rows: self
                .rows
                .iter()
                .copied()
                .filter(|&i| keep(&incidents[i]))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cascade levels
// ---------------------------------------------------------------------------

/// The three geographic levels, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Region,
    Province,
    Municipality,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Region, Level::Province, Level::Municipality];

    pub fn value(self, incident: &Incident) -> &str {
        match self {
            Level::Region => &incident.region,
            Level::Province => &incident.province,
            Level::Municipality => &incident.municipality,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Region => "Region",
            Level::Province => "Province",
            Level::Municipality => "Municipality",
        }
    }
}

/// Rows whose calendar year lies in `[start, end]`, bounds in either order.
pub fn by_years<'a>(selection: &Selection<'a>, (start, end): (i32, i32)) -> Selection<'a> {
    let (lo, hi) = (start.min(end), start.max(end));
    selection.narrow(|i| (lo..=hi).contains(&i.year()))
}

/// Rows matching `choice` at `level`; [`Choice::All`] keeps everything.
pub fn by_level<'a>(selection: &Selection<'a>, level: Level, choice: &Choice) -> Selection<'a> {
    if choice.is_all() {
        return selection.clone();
    }
    selection.narrow(|i| choice.admits(level.value(i)))
}

/// Sorted distinct values of `level` among the selected rows.
pub fn options(selection: &Selection<'_>, level: Level) -> Vec<String> {
    selection
        .iter()
        .map(|i| level.value(i))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Filter parameters and result
// ---------------------------------------------------------------------------

/// The user's constraints, applied in field order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterParams {
    pub years: (i32, i32),
    pub region: Choice,
    pub province: Choice,
    pub municipality: Choice,
}

impl FilterParams {
    /// All years of `table`, every level unfiltered.
    pub fn full_range(table: &NormalizedTable) -> Self {
        FilterParams {
            years: table.year_bounds().unwrap_or_default(),
            ..FilterParams::default()
        }
    }

    pub fn choice(&self, level: Level) -> &Choice {
        match level {
            Level::Region => &self.region,
            Level::Province => &self.province,
            Level::Municipality => &self.municipality,
        }
    }

    /// Set `level` and reset every finer level to [`Choice::All`].
    pub fn select(&mut self, level: Level, choice: Choice) {
        match level {
            Level::Region => {
                self.region = choice;
                self.province = Choice::All;
                self.municipality = Choice::All;
            }
            Level::Province => {
                self.province = choice;
                self.municipality = Choice::All;
            }
            Level::Municipality => self.municipality = choice,
        }
    }
}

/// Outcome of one pass of the cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    pub params: FilterParams,
    pub selection: Selection<'a>,
    pub region_options: Vec<String>,
    pub province_options: Vec<String>,
    pub municipality_options: Vec<String>,
    pub aggregates: Aggregates,
}

/// Run the cascade: years, then region, province and municipality, each
/// level's options taken from the rows that survived the coarser levels.
pub fn filter<'a>(table: &'a NormalizedTable, params: &FilterParams) -> FilteredView<'a> {
    let in_years = by_years(&Selection::all(table), params.years);

    let region_options = options(&in_years, Level::Region);
    let in_region = by_level(&in_years, Level::Region, &params.region);

    let province_options = options(&in_region, Level::Province);
    let in_province = by_level(&in_region, Level::Province, &params.province);

    let municipality_options = options(&in_province, Level::Municipality);
    let selection = by_level(&in_province, Level::Municipality, &params.municipality);

    let aggregates = Aggregates::compute(&selection);
    log::debug!(
        "filter {:?}: {} of {} rows",
        params,
        selection.len(),
        table.len()
    );

    FilteredView {
        params: params.clone(),
        selection,
        region_options,
        province_options,
        municipality_options,
        aggregates,
    }
}
