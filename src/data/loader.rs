use std::collections::HashMap;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use anyhow::Context;
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::config::{ColumnNames, DashboardConfig, LookupColumns};

use super::archive::{self, ArchiveEntry, EntryKind};
use super::error::DataSourceError;
use super::lookup::{parse_code, Lookup};
use super::model::{Incident, NormalizedTable, UNKNOWN, UNSPECIFIED};

/// Column names used when normalizing a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LoadOptions {
    pub columns: ColumnNames,
    pub lookup_columns: LookupColumns,
}

impl From<&DashboardConfig> for LoadOptions {
    fn from(config: &DashboardConfig) -> Self {
        LoadOptions {
            columns: config.columns.clone(),
            lookup_columns: config.lookup_columns.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and normalize the incident table inside `archive_path`.
///
/// A lookup that cannot be read is logged and ignored; identifiers then pass
/// through unresolved. A source that yields no dated rows is
/// [`DataSourceError::EmptyResult`].
pub fn load(
    archive_path: &Path,
    lookup_path: Option<&Path>,
    options: &LoadOptions,
) -> Result<NormalizedTable, DataSourceError> {
    let entry = archive::read_data_entry(archive_path)?;
    let raw = match entry.kind {
        EntryKind::Csv => parse_csv(&entry)?,
        EntryKind::Parquet => parse_parquet(&entry)?,
    };
    log::info!(
        "{}: {} rows x {} columns in {}",
        archive_path.display(),
        raw.rows.len(),
        raw.headers.len(),
        entry.name
    );

    let lookup = lookup_path
        .map(|p| Lookup::load_or_empty(p, &options.lookup_columns))
        .unwrap_or_default();

    let table = normalize(&raw, &entry.name, &lookup, &options.columns)?;
    if table.is_empty() {
        return Err(DataSourceError::EmptyResult);
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Raw grid
// ---------------------------------------------------------------------------

/// Header row plus trimmed cells; empty cells are `None`.
#[derive(Debug, Default)]
pub(crate) struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
    }
}

fn cell(row: &[Option<String>], idx: Option<usize>) -> Option<&str> {
    row.get(idx?)?.as_deref()
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Non-UTF-8 bytes (Latin-1 exports are common) are replaced rather than
/// failing the whole file.
fn parse_csv(entry: &ArchiveEntry) -> Result<RawTable, DataSourceError> {
    let csv_err = |source| DataSourceError::Csv {
        entry: entry.name.clone(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(entry.bytes.as_slice());

    let headers = reader
        .byte_headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(csv_err)?;
        rows.push(
            record
                .iter()
                .map(|b| {
                    let s = String::from_utf8_lossy(b);
                    (!s.is_empty()).then(|| s.into_owned())
                })
                .collect(),
        );
    }
    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

fn parse_parquet(entry: &ArchiveEntry) -> Result<RawTable, DataSourceError> {
    read_parquet(&entry.bytes).map_err(|source| DataSourceError::Parquet {
        entry: entry.name.clone(),
        source,
    })
}

/// Every column is cast to text so CSV and Parquet share one coercion path.
fn read_parquet(bytes: &[u8]) -> anyhow::Result<RawTable> {
    let mut file = tempfile::tempfile().context("creating scratch file")?;
    file.write_all(bytes).context("buffering parquet entry")?;
    file.seek(SeekFrom::Start(0))?;

    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch.context("reading parquet record batch")?;
        let text_columns = batch
            .columns()
            .iter()
            .map(|c| cast(c, &DataType::Utf8))
            .collect::<Result<Vec<_>, _>>()
            .context("casting parquet columns to text")?;

        for row in 0..batch.num_rows() {
            rows.push(
                text_columns
                    .iter()
                    .map(|c| {
                        let s = c.as_string::<i32>();
                        if s.is_null(row) {
                            return None;
                        }
                        let v = s.value(row).trim();
                        (!v.is_empty()).then(|| v.to_string())
                    })
                    .collect(),
            );
        }
    }
    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// How the cause of each row is obtained.
#[derive(Debug, Clone, Copy)]
enum CauseSource {
    /// Numeric code resolved through the lookup's cause mapping.
    Coded(usize),
    /// Descriptive text (or an unresolvable raw code) used as-is.
    Verbatim(usize),
    Absent,
}

fn cause_source(raw: &RawTable, columns: &ColumnNames, lookup: &Lookup) -> CauseSource {
    let code_idx = columns.cause_code.as_deref().and_then(|c| raw.column(c));
    let text_idx = columns.cause_text.as_deref().and_then(|c| raw.column(c));
    match (code_idx, text_idx) {
        (Some(idx), _) if !lookup.causes.is_empty() => CauseSource::Coded(idx),
        (_, Some(idx)) => CauseSource::Verbatim(idx),
        (Some(idx), None) => {
            log::warn!("cause codes present but no cause lookup; showing raw codes");
            CauseSource::Verbatim(idx)
        }
        (None, None) => {
            log::warn!("no cause column found; cause breakdown disabled");
            CauseSource::Absent
        }
    }
}

/// Resolve a geographic code through `names`.
///
/// An empty mapping means no lookup was available, so the raw code itself is
/// the display name.
fn resolve_geo(raw: Option<&str>, names: &HashMap<i64, String>) -> String {
    let Some(raw) = raw else {
        return UNKNOWN.to_string();
    };
    if names.is_empty() {
        return raw.to_string();
    }
    parse_code(raw)
        .and_then(|code| names.get(&code))
        .cloned()
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn resolve_cause(raw: Option<&str>, source: CauseSource, lookup: &Lookup) -> Option<String> {
    let resolved = match source {
        CauseSource::Absent => return None,
        CauseSource::Coded(_) => raw
            .and_then(parse_code)
            .and_then(|code| lookup.causes.get(&code))
            .cloned(),
        CauseSource::Verbatim(_) => raw.map(str::to_string),
    };
    Some(resolved.unwrap_or_else(|| UNSPECIFIED.to_string()))
}

/// A numeric column and how many of its non-empty cells failed to parse.
struct NumericColumn<'a> {
    name: &'a str,
    idx: Option<usize>,
    failures: usize,
}

impl<'a> NumericColumn<'a> {
    fn new(raw: &RawTable, name: &'a str) -> Self {
        let idx = raw.column(name);
        if idx.is_none() {
            log::warn!("numeric column '{name}' not found; values treated as missing");
        }
        NumericColumn {
            name,
            idx,
            failures: 0,
        }
    }

    fn read(&mut self, row: &[Option<String>]) -> Option<f64> {
        let text = cell(row, self.idx)?;
        let value = parse_number(text);
        if value.is_none() {
            self.failures += 1;
        }
        value
    }

    fn report(&self) {
        if self.failures > 0 {
            log::debug!("'{}': {} values not numeric, treated as missing", self.name, self.failures);
        }
    }
}

/// Turn a raw grid into the normalized table.
pub(crate) fn normalize(
    raw: &RawTable,
    entry: &str,
    lookup: &Lookup,
    columns: &ColumnNames,
) -> Result<NormalizedTable, DataSourceError> {
    let required = |name: &str| {
        raw.column(name).ok_or_else(|| DataSourceError::MissingColumn {
            entry: entry.to_string(),
            column: name.to_string(),
        })
    };
    let date_idx = required(&columns.date)?;
    let region_idx = required(&columns.region)?;
    let province_idx = required(&columns.province)?;
    let municipality_idx = required(&columns.municipality)?;

    let mut burned = NumericColumn::new(raw, &columns.burned_area);
    let mut cost = NumericColumn::new(raw, &columns.suppression_cost);
    let mut loss = NumericColumn::new(raw, &columns.economic_loss);
    let mut lat = NumericColumn::new(raw, &columns.latitude);
    let mut lng = NumericColumn::new(raw, &columns.longitude);

    let causes = cause_source(raw, columns, lookup);
    let cause_idx = match causes {
        CauseSource::Coded(i) | CauseSource::Verbatim(i) => Some(i),
        CauseSource::Absent => None,
    };

    let mut incidents = Vec::with_capacity(raw.rows.len());
    let mut undated = 0usize;

    for row in &raw.rows {
        let Some(date) = cell(row, Some(date_idx)).and_then(parse_incident_date) else {
            undated += 1;
            continue;
        };
        let region_code = cell(row, Some(region_idx));
        let province_code = cell(row, Some(province_idx));

        incidents.push(Incident {
            date,
            region_code: region_code.unwrap_or_default().to_string(),
            region: resolve_geo(region_code, &lookup.regions),
            province_code: province_code.unwrap_or_default().to_string(),
            province: resolve_geo(province_code, &lookup.provinces),
            municipality: cell(row, Some(municipality_idx))
                .unwrap_or(UNKNOWN)
                .to_string(),
            burned_area: burned.read(row),
            suppression_cost: cost.read(row),
            economic_loss: loss.read(row),
            latitude: lat.read(row),
            longitude: lng.read(row),
            cause: resolve_cause(cell(row, cause_idx), causes, lookup),
        });
    }

    if undated > 0 {
        log::warn!("{entry}: dropped {undated} rows with missing or unparseable dates");
    }
    for col in [&burned, &cost, &loss, &lat, &lng] {
        col.report();
    }
    log::info!("{entry}: {} incidents normalized", incidents.len());

    Ok(NormalizedTable::new(incidents, entry))
}

// ---------------------------------------------------------------------------
// Value parsing
// ---------------------------------------------------------------------------

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parse the date part of `s`; a trailing time of day is ignored.
pub fn parse_incident_date(s: &str) -> Option<NaiveDate> {
    let date_part = s.trim().split(['T', ' ']).next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Parse a real number; a lone decimal comma is accepted.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let value = s.parse::<f64>().ok().or_else(|| {
        if s.contains(',') && !s.contains('.') {
            s.replace(',', ".").parse::<f64>().ok()
        } else {
            None
        }
    })?;
    value.is_finite().then_some(value)
}
