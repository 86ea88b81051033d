//! File-based persistence: dataset, caches and reports.
//!
//! Every write is a whole-file replacement through a temporary file in the
//! destination directory followed by an atomic rename, so a reader never
//! observes a half-written document.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Dataset;

/// What an input file is, for error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Dataset,
    Boundaries,
    ReferenceList,
    PoiExport,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Dataset => write!(f, "dataset"),
            InputKind::Boundaries => write!(f, "boundary file"),
            InputKind::ReferenceList => write!(f, "reference list"),
            InputKind::PoiExport => write!(f, "POI export"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {}", path.display())]
    MissingInput { kind: InputKind, path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Fail unless `path` exists. Used for pre-flight checks before any mutation.
pub fn require_input(path: &Path, kind: InputKind) -> Result<(), StoreError> {
    if path.exists() {
        Ok(())
    } else {
        Err(StoreError::MissingInput {
            kind,
            path: path.to_path_buf(),
        })
    }
}

/// Open an input for reading, decompressing `.gz` files on the fly
fn open_input(path: &Path, kind: InputKind) -> Result<Box<dyn Read>, StoreError> {
    require_input(path, kind)?;
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Read and decode a required JSON input
pub fn read_json<T: DeserializeOwned>(path: &Path, kind: InputKind) -> Result<T, StoreError> {
    let reader = open_input(path, kind)?;
    serde_json::from_reader(reader).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a required text input
pub fn read_text(path: &Path, kind: InputKind) -> Result<String, StoreError> {
    let mut reader = open_input(path, kind)?;
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| StoreError::io(path, e))?;
    Ok(text)
}

/// Read an optional JSON file, falling back to `T::default()` when it is
/// absent or unreadable
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    let parsed = File::open(path)
        .map_err(|e| e.to_string())
        .and_then(|f| serde_json::from_reader(BufReader::new(f)).map_err(|e| e.to_string()));
    match parsed {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring unreadable {}: {}", path.display(), e);
            T::default()
        }
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path`
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

    let tmp = NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(&dir, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(b"\n").map_err(|e| StoreError::io(path, e))?;
        writer.flush().map_err(|e| StoreError::io(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(path, e))?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

/// Load the place dataset; a missing file is a fatal input error
pub fn load_dataset(path: &Path) -> Result<Dataset, StoreError> {
    read_json(path, InputKind::Dataset)
}

/// Sort by name and atomically write the dataset
pub fn save_dataset(path: &Path, dataset: &mut Dataset) -> Result<(), StoreError> {
    dataset.sort();
    write_json_atomic(path, dataset)
}
