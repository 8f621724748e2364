use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::error::DataSourceError;
use super::loader::{self, LoadOptions};
use super::model::NormalizedTable;

// ---------------------------------------------------------------------------
// Source identity
// ---------------------------------------------------------------------------

/// Path, size and modification time of one input file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileStamp {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl FileStamp {
    /// Stamp `path` as it is on disk right now.
    pub fn of(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(FileStamp {
            path: path.canonicalize().unwrap_or_else(|_| path.to_path_buf()),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// What a cached table was built from. Any change in either file yields a
/// different identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceIdentity {
    pub archive: FileStamp,
    /// `None` when no lookup was requested or the file is missing.
    pub lookup: Option<FileStamp>,
    /// Lookup path as requested, so a missing lookup that later appears
    /// still invalidates.
    pub lookup_path: Option<PathBuf>,
    pub options: LoadOptions,
}

impl SourceIdentity {
    pub fn resolve(
        archive: &Path,
        lookup: Option<&Path>,
        options: &LoadOptions,
    ) -> Result<Self, DataSourceError> {
        let archive = FileStamp::of(archive).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DataSourceError::SourceNotFound(archive.to_path_buf()),
            _ => DataSourceError::Io {
                entry: archive.display().to_string(),
                source: e,
            },
        })?;
        Ok(SourceIdentity {
            archive,
            lookup: lookup.and_then(|p| FileStamp::of(p).ok()),
            lookup_path: lookup.map(Path::to_path_buf),
            options: options.clone(),
        })
    }

    fn same_paths(&self, other: &SourceIdentity) -> bool {
        self.archive.path == other.archive.path && self.lookup_path == other.lookup_path
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Memoized loads, shared as `Arc` so any number of views can read one table.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<SourceIdentity, Arc<NormalizedTable>>,
    parses: usize,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the table for these inputs, parsing only if they are new or
    /// have changed on disk. Failed loads are not cached.
    pub fn load(
        &mut self,
        archive: &Path,
        lookup: Option<&Path>,
        options: &LoadOptions,
    ) -> Result<Arc<NormalizedTable>, DataSourceError> {
        let identity = SourceIdentity::resolve(archive, lookup, options)?;
        if let Some(table) = self.entries.get(&identity) {
            log::debug!("cache hit for {}", archive.display());
            return Ok(Arc::clone(table));
        }

        let before = self.entries.len();
        self.entries.retain(|k, _| !k.same_paths(&identity));
        if self.entries.len() < before {
            log::info!("{} changed on disk, reloading", archive.display());
        }

        log::info!("cache miss for {}, parsing", archive.display());
        self.parses += 1;
        let table = Arc::new(loader::load(archive, lookup, options)?);
        self.entries.insert(identity, Arc::clone(&table));
        Ok(table)
    }

    /// Drop every entry built from `archive`.
    pub fn invalidate(&mut self, archive: &Path) {
        let canonical = archive
            .canonicalize()
            .unwrap_or_else(|_| archive.to_path_buf());
        self.entries
            .retain(|k, _| k.archive.path != canonical && k.archive.path != archive);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of actual parses performed, hits excluded.
    pub fn parses(&self) -> usize {
        self.parses
    }
}
