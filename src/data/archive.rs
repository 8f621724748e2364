use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use super::error::DataSourceError;

/// Tabular formats accepted inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Csv,
    Parquet,
}

impl EntryKind {
    fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Some(EntryKind::Csv)
        } else if lower.ends_with(".parquet") || lower.ends_with(".pq") {
            Some(EntryKind::Parquet)
        } else {
            None
        }
    }
}

/// The data file extracted from the archive, fully buffered.
#[derive(Debug)]
pub struct ArchiveEntry {
    pub name: String,
    pub kind: EntryKind,
    pub bytes: Vec<u8>,
}

/// macOS resource forks and Finder metadata ride along in zips made on a Mac.
fn is_platform_metadata(name: &str) -> bool {
    name.starts_with("__MACOSX/")
        || name.contains("/__MACOSX/")
        || name
            .rsplit('/')
            .next()
            .is_some_and(|base| base.starts_with("._") || base == ".DS_Store")
}

/// Open `path` and buffer the first qualifying data file in archive order.
pub fn read_data_entry(path: &Path) -> Result<ArchiveEntry, DataSourceError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataSourceError::SourceNotFound(path.to_path_buf()),
        _ => DataSourceError::Io {
            entry: path.display().to_string(),
            source: e,
        },
    })?;
    let mut archive = ZipArchive::new(file).map_err(|source| DataSourceError::Archive {
        path: path.to_path_buf(),
        source,
    })?;

    let mut chosen: Option<(usize, String, EntryKind)> = None;
    for i in 0..archive.len() {
        let entry = archive
            .by_index_raw(i)
            .map_err(|source| DataSourceError::Archive {
                path: path.to_path_buf(),
                source,
            })?;
        let name = entry.name().to_string();
        if !entry.is_file() || is_platform_metadata(&name) {
            continue;
        }
        let Some(kind) = EntryKind::from_name(&name) else {
            continue;
        };
        match &chosen {
            None => chosen = Some((i, name, kind)),
            Some((_, first, _)) => {
                log::warn!("{}: ignoring extra data file {name}, using {first}", path.display());
            }
        }
    }

    let Some((idx, name, kind)) = chosen else {
        return Err(DataSourceError::NoQualifyingFileInArchive(path.to_path_buf()));
    };

    let mut entry = archive
        .by_index(idx)
        .map_err(|source| DataSourceError::Archive {
            path: path.to_path_buf(),
            source,
        })?;
    let mut bytes = Vec::with_capacity(initial_capacity(entry.size()));
    entry
        .read_to_end(&mut bytes)
        .map_err(|source| DataSourceError::Io {
            entry: name.clone(),
            source,
        })?;

    log::debug!("{}: extracted {name} ({} bytes)", path.display(), bytes.len());
    Ok(ArchiveEntry { name, kind, bytes })
}

/// Upper bound on the buffer reserved from a header's declared size; the
/// read itself grows past it if the entry really is larger.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

fn initial_capacity(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}
