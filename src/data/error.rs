use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Fatal load errors
// ---------------------------------------------------------------------------

/// Reasons a dataset load fails as a whole.
///
/// Anything recoverable (a broken lookup workbook, a single unparseable
/// number) is absorbed inside the loader and never surfaces here.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("no .csv or .parquet data file inside {}", .0.display())]
    NoQualifyingFileInArchive(PathBuf),

    #[error("reading archive {}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("reading {entry}")]
    Io {
        entry: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing CSV entry {entry}")]
    Csv {
        entry: String,
        #[source]
        source: csv::Error,
    },

    #[error("parsing Parquet entry {entry}")]
    Parquet {
        entry: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{entry} has no '{column}' column")]
    MissingColumn { entry: String, column: String },

    #[error("dataset contains no usable rows")]
    EmptyResult,
}

impl DataSourceError {
    /// Whether the source simply did not exist (as opposed to being malformed).
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataSourceError::SourceNotFound(_))
    }
}

// ---------------------------------------------------------------------------
// Lookup errors (recovered locally by the loader)
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported lookup format: .{0}")]
    UnsupportedFormat(String),

    #[error("reading workbook")]
    Workbook(#[from] calamine::Error),

    #[error("reading lookup CSV")]
    Csv(#[from] csv::Error),
}
