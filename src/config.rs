//! Pipeline configuration, loaded from an optional TOML file.
//!
//! Every field has a default, so a missing file (or a partial one) is valid.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub region: RegionConfig,
    pub geocoder: GeocoderConfig,
    pub checkpoint: CheckpointConfig,
    pub overpass: OverpassConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    /// Place dataset read by every mode
    pub dataset: PathBuf,
    /// Where enrichment results are written (defaults to `dataset`)
    pub output: Option<PathBuf>,
    pub boundaries: PathBuf,
    /// Reverse-geocode cache
    pub cache: PathBuf,
    /// Curated reference list for gap-filling and audits
    pub curated: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("public/tamil_nadu_locations.json"),
            output: None,
            boundaries: PathBuf::from("data/geoBoundaries-IND-ADM2_simplified.geojson"),
            cache: PathBuf::from("data/district_cache.json"),
            curated: None,
        }
    }
}

impl PathsConfig {
    pub fn output(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.dataset)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RegionConfig {
    /// State name; also the placeholder district of unresolved records
    pub state: String,
    pub country: String,
    pub country_code: String,
    /// District targeted by gap-filling and audits
    pub target: Option<String>,
    /// Alternate spelling → canonical district name
    pub aliases: BTreeMap<String, String>,
    /// Extra district spellings tried in text-search fallback queries
    pub search_hints: Vec<String>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert("Thoothukudi".to_string(), "Thoothukkudi".to_string());
        Self {
            state: "Tamil Nadu".to_string(),
            country: "India".to_string(),
            country_code: "in".to_string(),
            target: None,
            aliases,
            search_hints: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocoderConfig {
    pub search_url: String,
    pub reverse_url: String,
    /// Identifying user agent; required by the geocoder's usage policy
    pub user_agent: String,
    /// Minimum spacing between outbound requests
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
    pub retry_base_ms: u64,
    pub rate_limit_base_ms: u64,
    pub max_retries: u32,
    pub max_rate_limit_retries: u32,
    pub result_limit: u32,
    pub reverse_zoom: u32,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            search_url: "https://nominatim.openstreetmap.org/search".to_string(),
            reverse_url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            user_agent: String::new(),
            min_interval_ms: 1200,
            timeout_secs: 20,
            retry_base_ms: 1500,
            rate_limit_base_ms: 2000,
            max_retries: 2,
            max_rate_limit_retries: 3,
            result_limit: 5,
            reverse_zoom: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Flush dataset and cache every N records
    pub every: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self { every: 200 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OverpassConfig {
    pub url: String,
    /// Overpass area id (relation id + 3600000000)
    pub area_id: u64,
    /// `place=*` values selected by the bulk import query
    pub place_kinds: Vec<String>,
    /// Server-side query timeout; the HTTP client waits a little longer
    pub timeout_secs: u64,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            url: "https://overpass-api.de/api/interpreter".to_string(),
            area_id: 3_600_096_905,
            place_kinds: ["city", "town", "village", "hamlet", "suburb", "locality"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: 180,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }
}
