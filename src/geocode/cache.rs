//! On-disk cache of raw reverse-geocode responses keyed by `"lat,lon"`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use crate::store::{read_json_or_default, write_json_atomic, StoreError};

pub struct GeocodeCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, Value>,
    dirty: bool,
}

impl GeocodeCache {
    /// Load from disk; a missing or unreadable file starts an empty cache
    pub fn load(path: &Path) -> Self {
        let entries: BTreeMap<String, Value> = read_json_or_default(path);
        info!("Loaded {} cached geocode responses", entries.len());
        Self {
            path: Some(path.to_path_buf()),
            entries,
            dirty: false,
        }
    }

    /// Cache that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Atomically rewrite the cache file if anything changed
    pub fn save(&mut self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        write_json_atomic(path, &self.entries)?;
        self.dirty = false;
        Ok(())
    }
}
