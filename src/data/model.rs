use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};

/// Display name for a geographic code with no entry in a non-empty lookup.
pub const UNKNOWN: &str = "Unknown";

/// Display name for a cause that is empty, unparseable or unmapped.
pub const UNSPECIFIED: &str = "Unspecified";

// ---------------------------------------------------------------------------
// Incident – one row of the source table
// ---------------------------------------------------------------------------

/// A single wildfire incident after parsing, coercion and name resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub date: NaiveDate,
    /// Region code as it appeared in the source (trimmed).
    pub region_code: String,
    /// Resolved region name, the raw code, or [`UNKNOWN`].
    pub region: String,
    pub province_code: String,
    pub province: String,
    pub municipality: String,
    /// Hectares.
    pub burned_area: Option<f64>,
    pub suppression_cost: Option<f64>,
    pub economic_loss: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// `None` only when the table carries no cause column at all.
    pub cause: Option<String>,
}

impl Incident {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Both coordinates, if present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

// ---------------------------------------------------------------------------
// NormalizedTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The immutable, normalized incident table produced by the loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    incidents: Vec<Incident>,
    years: Vec<i32>,
    has_causes: bool,
    /// Name of the archive entry the rows were read from.
    pub entry_name: String,
}

impl NormalizedTable {
    pub fn new(incidents: Vec<Incident>, entry_name: impl Into<String>) -> Self {
        let years: BTreeSet<i32> = incidents.iter().map(Incident::year).collect();
        let has_causes = incidents.iter().any(|i| i.cause.is_some());
        NormalizedTable {
            incidents,
            years: years.into_iter().collect(),
            has_causes,
            entry_name: entry_name.into(),
        }
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn get(&self, idx: usize) -> Option<&Incident> {
        self.incidents.get(idx)
    }

    /// Sorted distinct calendar years present in the table.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// `(first, last)` year, or `None` for an empty table.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        Some((*self.years.first()?, *self.years.last()?))
    }

    /// Whether any cause information was loaded.
    pub fn has_causes(&self) -> bool {
        self.has_causes
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Choice – one level of the geographic cascade
// ---------------------------------------------------------------------------

/// A selection at one cascade level: everything, or one named value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

impl Choice {
    pub fn only(value: impl Into<String>) -> Self {
        Choice::Only(value.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }

    /// Whether `value` passes this choice.
    pub fn admits(&self, value: &str) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(v) => v == value,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => write!(f, "All"),
            Choice::Only(v) => write!(f, "{v}"),
        }
    }
}
