use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Config file read when no path is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "incendios.json";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Everything the dashboard needs to know before loading data.
///
/// ```json
/// {
///   "archive": "fires-all.csv.zip",
///   "lookup": "lookup.xlsx",
///   "columns": { "cause_code": "causa" },
///   "max_map_points": 1000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Zip archive holding the incident table.
    pub archive: PathBuf,
    /// Optional workbook mapping region/province/cause ids to names.
    pub lookup: Option<PathBuf>,
    pub columns: ColumnNames,
    pub lookup_columns: LookupColumns,
    /// Upper bound on points drawn on the map.
    pub max_map_points: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            archive: PathBuf::from("fires-all.csv.zip"),
            lookup: None,
            columns: ColumnNames::default(),
            lookup_columns: LookupColumns::default(),
            max_map_points: 2000,
        }
    }
}

impl DashboardConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;

        // Relative data paths are taken relative to the config file.
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(DashboardConfig {
            archive: base.join(&config.archive),
            lookup: config.lookup.as_ref().map(|l| base.join(l)),
            ..config
        })
    }
}

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Source column names in the incident table.
///
/// The cause code and cause text are separate columns: the code is resolved
/// through the lookup's cause mapping, the text is used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNames {
    pub date: String,
    pub region: String,
    pub province: String,
    pub municipality: String,
    pub burned_area: String,
    pub suppression_cost: String,
    pub economic_loss: String,
    pub latitude: String,
    pub longitude: String,
    pub cause_code: Option<String>,
    pub cause_text: Option<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            date: "fecha".into(),
            region: "idcomunidad".into(),
            province: "idprovincia".into(),
            municipality: "municipio".into(),
            burned_area: "superficie".into(),
            suppression_cost: "gastos".into(),
            economic_loss: "perdidas".into(),
            latitude: "lat".into(),
            longitude: "lng".into(),
            cause_code: Some("idcausa".into()),
            cause_text: Some("causa_desc".into()),
        }
    }
}

/// Header pairs in the lookup workbook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LookupColumns {
    pub region_id: String,
    pub region_name: String,
    pub province_id: String,
    pub province_name: String,
    pub cause_id: String,
    pub cause_name: String,
}

impl Default for LookupColumns {
    fn default() -> Self {
        Self {
            region_id: "idcomunidad".into(),
            region_name: "comunidad".into(),
            province_id: "idprovincia".into(),
            province_name: "provincia".into(),
            cause_id: "idcausa".into(),
            cause_name: "causa".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = DashboardConfig::load(&dir.path().join("absent.json"))?;
        assert_eq!(config, DashboardConfig::default());
        Ok(())
    }

    #[test]
    fn partial_file_overrides_and_resolves_paths() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("incendios.json");
        let mut f = std::fs::File::create(&path)?;
        write!(
            f,
            r#"{{"lookup": "names.xlsx", "columns": {{"cause_code": "causa", "cause_text": null}}, "max_map_points": 10}}"#
        )?;

        let config = DashboardConfig::load(&path)?;
        assert_eq!(config.archive, dir.path().join("fires-all.csv.zip"));
        assert_eq!(config.lookup, Some(dir.path().join("names.xlsx")));
        assert_eq!(config.columns.cause_code.as_deref(), Some("causa"));
        assert_eq!(config.columns.cause_text, None);
        assert_eq!(config.columns.date, "fecha");
        assert_eq!(config.max_map_points, 10);
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"archiv": "typo.zip"}"#)?;
        assert!(DashboardConfig::load(&path).is_err());
        Ok(())
    }
}
