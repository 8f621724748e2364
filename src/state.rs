use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use incendios::config::DashboardConfig;
use incendios::data::aggregate::Aggregates;
use incendios::data::{
    filter, Choice, DataSourceError, DatasetCache, FilterParams, Level, LoadOptions, MapLayer,
    NormalizedTable,
};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Snapshot of the last filter pass
// ---------------------------------------------------------------------------

/// Owned copy of a [`incendios::data::FilteredView`] plus its map layer, so
/// the UI can hold it across frames.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Selected rows, newest first.
    pub rows: Vec<usize>,
    pub region_options: Vec<String>,
    pub province_options: Vec<String>,
    pub municipality_options: Vec<String>,
    pub aggregates: Aggregates,
    pub map: MapLayer,
}

impl Snapshot {
    pub fn options(&self, level: Level) -> &[String] {
        match level {
            Level::Region => &self.region_options,
            Level::Province => &self.province_options,
            Level::Municipality => &self.municipality_options,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    /// Loads memoized by file identity.
    pub cache: DatasetCache,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Arc<NormalizedTable>>,

    /// Current filter selections.
    pub params: FilterParams,

    /// Result of the last filter pass (cached).
    pub snapshot: Snapshot,

    /// Colours for the cause chart.
    pub cause_colors: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            cache: DatasetCache::new(),
            dataset: None,
            params: FilterParams::default(),
            snapshot: Snapshot::default(),
            cause_colors: None,
            status_message: None,
        }
    }

    /// Load the archive and lookup named in the configuration.
    pub fn load_configured(&mut self) {
        let archive = self.config.archive.clone();
        let lookup = self.config.lookup.clone();
        self.load(archive, lookup);
    }

    /// Load `archive` (through the cache) and make it the current dataset.
    /// On failure nothing stays on screen but the error.
    pub fn load(&mut self, archive: PathBuf, lookup: Option<PathBuf>) {
        let options = LoadOptions::from(&self.config);
        match self.cache.load(&archive, lookup.as_deref(), &options) {
            Ok(table) => {
                log::info!(
                    "Loaded {} incidents ({} - {:?})",
                    table.len(),
                    table.entry_name,
                    table.year_bounds()
                );
                self.config.archive = archive;
                self.config.lookup = lookup;
                self.set_dataset(table);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", archive.display());
                self.dataset = None;
                self.snapshot = Snapshot::default();
                self.cause_colors = None;
                self.status_message = Some(error_message(&e));
            }
        }
    }

    /// Drop the cached table for the current archive and load it again.
    pub fn reload(&mut self) {
        self.cache.invalidate(&self.config.archive);
        self.load_configured();
    }

    /// Ingest a newly loaded dataset, reset filters and colours.
    pub fn set_dataset(&mut self, dataset: Arc<NormalizedTable>) {
        self.params = FilterParams::full_range(&dataset);
        self.cause_colors = Some(ColorMap::for_causes(&dataset));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the snapshot after a filter change.
    pub fn refilter(&mut self) {
        let Some(table) = &self.dataset else {
            return;
        };
        let view = filter(table, &self.params);
        let map = MapLayer::build(&view, self.config.max_map_points);

        let mut rows = view.selection.indices().to_vec();
        let incidents = table.incidents();
        rows.sort_by(|&a, &b| incidents[b].date.cmp(&incidents[a].date));

        self.snapshot = Snapshot {
            rows,
            region_options: view.region_options,
            province_options: view.province_options,
            municipality_options: view.municipality_options,
            aggregates: view.aggregates,
            map,
        };
    }

    /// Full year range and every level back to "all".
    pub fn reset_filters(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        self.params = FilterParams::full_range(dataset);
        self.refilter();
    }

    /// Change one cascade level; finer levels go back to "all".
    pub fn select(&mut self, level: Level, choice: Choice) {
        if self.params.choice(level) == &choice {
            return;
        }
        self.params.select(level, choice);
        self.refilter();
    }

    /// Change the year range; a geographic choice no longer on offer is reset.
    pub fn set_years(&mut self, start: i32, end: i32) {
        if self.params.years == (start, end) {
            return;
        }
        self.params.years = (start, end);
        self.refilter();

        for level in Level::ALL {
            if let Choice::Only(v) = self.params.choice(level) {
                if !self.snapshot.options(level).contains(v) {
                    self.params.select(level, Choice::All);
                    self.refilter();
                    break;
                }
            }
        }
    }
}

fn error_message(e: &DataSourceError) -> String {
    let mut msg = format!("Error loading data: {e}");
    let mut source = e.source();
    while let Some(s) = source {
        msg.push_str(&format!(": {s}"));
        source = s.source();
    }
    msg
}
