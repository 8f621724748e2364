use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::config::LookupColumns;

use super::error::LookupError;

/// One sheet as a header row plus trimmed, non-empty cells.
struct Grid {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Grid {
    fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(header))
    }
}

/// Identifier → display name mappings for regions, provinces and causes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookup {
    pub regions: HashMap<i64, String>,
    pub provinces: HashMap<i64, String>,
    pub causes: HashMap<i64, String>,
}

impl Lookup {
    /// Load all three mappings from a workbook (`xlsx`, `xls`, `xlsb`, `ods`)
    /// or a single CSV sheet.
    pub fn load(path: &Path, columns: &LookupColumns) -> Result<Self, LookupError> {
        if !path.exists() {
            return Err(LookupError::NotFound(path.to_path_buf()));
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let sheets = match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook(path)?,
            "csv" => vec![read_csv(path)?],
            other => return Err(LookupError::UnsupportedFormat(other.to_string())),
        };

        Ok(Lookup {
            regions: mapping(&sheets, &columns.region_id, &columns.region_name),
            provinces: mapping(&sheets, &columns.province_id, &columns.province_name),
            causes: mapping(&sheets, &columns.cause_id, &columns.cause_name),
        })
    }

    /// Like [`Lookup::load`], but a failure yields empty mappings so the
    /// main load can carry on with unresolved identifiers.
    pub fn load_or_empty(path: &Path, columns: &LookupColumns) -> Self {
        match Lookup::load(path, columns) {
            Ok(lookup) => {
                log::info!(
                    "lookup {}: {} regions, {} provinces, {} causes",
                    path.display(),
                    lookup.regions.len(),
                    lookup.provinces.len(),
                    lookup.causes.len()
                );
                lookup
            }
            Err(e) => {
                log::warn!("lookup {} unavailable, names left unresolved: {e}", path.display());
                Lookup::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.provinces.is_empty() && self.causes.is_empty()
    }
}

/// Build `id → name` from the first sheet carrying both headers.
fn mapping(sheets: &[Grid], id_col: &str, name_col: &str) -> HashMap<i64, String> {
    let found = sheets
        .iter()
        .find_map(|g| Some((g, g.column(id_col)?, g.column(name_col)?)));
    let Some((grid, id_idx, name_idx)) = found else {
        log::warn!("lookup has no sheet with both '{id_col}' and '{name_col}'");
        return HashMap::new();
    };

    let mut map = HashMap::new();
    let mut skipped = 0usize;
    for row in &grid.rows {
        let id = row.get(id_idx).cloned().flatten().and_then(|s| parse_code(&s));
        let name = row.get(name_idx).cloned().flatten();
        match (id, name) {
            (Some(id), Some(name)) => {
                map.insert(id, name);
            }
            (None, None) => {}
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        log::debug!("sheet '{}': skipped {skipped} incomplete '{id_col}' rows", grid.name);
    }
    map
}

/// Parse an identifier written as `"10"`, `"10.0"` or `" 10 "`.
pub(crate) fn parse_code(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

fn read_workbook(path: &Path) -> Result<Vec<Grid>, LookupError> {
    let mut workbook = open_workbook_auto(path)?;
    let mut grids = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            continue;
        };
        let headers = header_row
            .iter()
            .map(|c| cell_text(c).unwrap_or_default())
            .collect();
        let rows = rows.map(|r| r.iter().map(cell_text).collect()).collect();
        grids.push(Grid { name, headers, rows });
    }
    Ok(grids)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => non_empty(s),
        Data::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        other => non_empty(&other.to_string()),
    }
}

/// Decoded lossily like the incident CSV, so a Latin-1 export keeps its
/// mappings and only the undecodable characters are replaced.
fn read_csv(path: &Path) -> Result<Grid, LookupError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut rows = Vec::new();
    for record in reader.byte_records() {
        rows.push(
            record?
                .iter()
                .map(|b| non_empty(&String::from_utf8_lossy(b)))
                .collect(),
        );
    }
    Ok(Grid {
        name: path.display().to_string(),
        headers,
        rows,
    })
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
