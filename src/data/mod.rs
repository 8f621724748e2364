//! Data layer: loading, normalization, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  fires.csv.zip  (+ lookup.xlsx)
//!        │
//!        ▼
//!   ┌──────────┐   ┌──────────┐
//!   │ archive  │   │  lookup  │  id → name mappings
//!   └──────────┘   └──────────┘
//!        │              │
//!        ▼              ▼
//!   ┌─────────────────────────┐
//!   │ loader (behind cache)   │  parse → NormalizedTable (Arc)
//!   └─────────────────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  years → region → province → municipality
//!   └──────────┘
//!        │
//!        ├──► aggregate   KPIs, yearly series, cause counts
//!        └──► map         geolocated, severity-tiered points
//! ```

pub mod aggregate;
pub mod archive;
pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod lookup;
pub mod map;
pub mod model;

pub use cache::DatasetCache;
pub use error::DataSourceError;
pub use filter::{filter, FilterParams, FilteredView, Level};
pub use loader::{load, LoadOptions};
pub use map::{MapLayer, Severity};
pub use model::{Choice, Incident, NormalizedTable};
