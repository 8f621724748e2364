//! Loading, normalization and cascading filters for Spanish wildfire
//! incident records, plus the configuration the dashboard reads at start-up.

pub mod config;
pub mod data;
