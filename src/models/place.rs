//! Place records and the persisted dataset document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AddressMap;

/// One canonical place in the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,

    /// Canonical district; absent or placeholder until resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taluk: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panchayat: Option<String>,

    #[serde(rename = "displayName", alias = "display_name", default)]
    pub display_name: String,

    /// Decimal degrees, kept as text to preserve source precision
    #[serde(default, deserialize_with = "de_coordinate")]
    pub lat: String,

    #[serde(default, deserialize_with = "de_coordinate")]
    pub lon: String,

    /// Upstream address components; merged, never replaced
    #[serde(rename = "rawAddress", alias = "raw_addr", default)]
    pub raw_address: AddressMap,

    /// Fields written by other tools, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Place {
    pub fn new(name: impl Into<String>, lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            district: None,
            taluk: None,
            panchayat: None,
            display_name: String::new(),
            lat: lat.into(),
            lon: lon.into(),
            raw_address: AddressMap::new(),
            extra: Map::new(),
        }
    }

    /// Parsed `(lon, lat)` if both coordinates are finite numbers
    pub fn point(&self) -> Option<(f64, f64)> {
        let lat: f64 = self.lat.trim().parse().ok()?;
        let lon: f64 = self.lon.trim().parse().ok()?;
        (lat.is_finite() && lon.is_finite()).then_some((lon, lat))
    }

    /// `"lat,lon"` key used by the reverse-geocode cache
    pub fn coordinate_key(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }

    /// Merge address components; incoming keys win, no key is removed
    pub fn merge_address(&mut self, address: &AddressMap) {
        for (key, value) in address {
            self.raw_address.insert(key.clone(), value.clone());
        }
    }
}

/// Provenance header of the dataset file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    #[serde(rename = "generatedAt", default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,

    #[serde(rename = "enrichedAt", default, skip_serializing_if = "Option::is_none")]
    pub enriched_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    /// Any other provenance keys (kept across rewrites)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The persisted dataset document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub meta: DatasetMeta,
    #[serde(default)]
    pub places: Vec<Place>,
}

impl Dataset {
    /// Sort places by name, byte-wise and case-sensitive
    pub fn sort(&mut self) {
        self.places.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

/// Accept coordinates written either as strings or as bare numbers
fn de_coordinate<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}
