use std::collections::BTreeMap;

use hashbrown::HashSet;
use serde::Deserialize;
use serde_json::Number;
use tracing::debug;

use super::Candidate;
use crate::models::address::pick;
use crate::models::AdminField;
use crate::reconcile::Region;

/// An Overpass JSON response
#[derive(Debug, Default, Deserialize)]
pub struct PoiExport {
    #[serde(default)]
    pub elements: Vec<PoiElement>,
}

#[derive(Debug, Deserialize)]
pub struct PoiElement {
    #[serde(default)]
    pub lat: Option<Number>,
    #[serde(default)]
    pub lon: Option<Number>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl PoiElement {
    fn to_candidate(&self) -> Option<Candidate> {
        let name = self.tags.get("name").map(|n| n.trim()).filter(|n| !n.is_empty())?;
        let field = |f: AdminField| pick(&self.tags, f.export_tags()).map(str::to_string);

        Some(Candidate {
            name: name.to_string(),
            district: field(AdminField::District),
            taluk: field(AdminField::Taluk),
            panchayat: field(AdminField::Panchayat),
            coordinates: match (&self.lat, &self.lon) {
                (Some(lat), Some(lon)) => Some((lat.to_string(), lon.to_string())),
                _ => None,
            },
            postcode: pick(&self.tags, &["addr:postcode"]).map(str::to_string),
        })
    }
}

/// Named elements as candidates.
///
/// Namesakes are kept: one village name can exist in several districts. Only
/// elements repeating the same merge key at the same coordinates are dropped.
pub fn candidates_from_export(export: &PoiExport, region: &Region) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for element in &export.elements {
        let Some(candidate) = element.to_candidate() else {
            continue;
        };
        let key = (
            region.normalize_name(&candidate.name),
            candidate.coordinates.clone(),
        );
        if seen.insert(key) {
            candidates.push(candidate);
        } else {
            debug!("Skipping duplicate element {}", candidate.name);
        }
    }
    candidates
}
