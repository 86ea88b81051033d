//! Source extraction: raw upstream inputs into normalized candidate records.
//!
//! Two sources feed the pipeline: a bulk point-of-interest export (Overpass
//! JSON, read from disk or fetched live) and a curated list of place names.

mod curated;
mod overpass;
mod poi;

pub use curated::{load_curated, parse_curated};
pub use overpass::{build_query, fetch_export};
pub use poi::{candidates_from_export, PoiElement, PoiExport};

use crate::models::Place;
use crate::reconcile::Region;

/// One record as yielded by a source, before reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub district: Option<String>,
    pub taluk: Option<String>,
    pub panchayat: Option<String>,
    /// `(lat, lon)` as written by the source
    pub coordinates: Option<(String, String)>,
    pub postcode: Option<String>,
}

impl Candidate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            district: None,
            taluk: None,
            panchayat: None,
            coordinates: None,
            postcode: None,
        }
    }

    /// Build the dataset record for a bulk import.
    ///
    /// Missing districts become the placeholder; the address map is seeded
    /// from whatever the source tagged.
    pub fn into_place(self, region: &Region) -> Place {
        let district = self
            .district
            .as_deref()
            .map(|d| region.canonical_district(d))
            .unwrap_or_else(|| region.placeholder().to_string());
        let (lat, lon) = self.coordinates.unwrap_or_default();

        let mut place = Place::new(self.name.clone(), lat, lon);
        place.display_name = match &self.taluk {
            Some(taluk) => format!(
                "{}, {}, {}, {}, {}",
                self.name, taluk, district, region.state, region.country
            ),
            None => format!(
                "{}, {}, {}, {}",
                self.name, district, region.state, region.country
            ),
        };

        let address = &mut place.raw_address;
        address.insert("village".into(), self.name.clone());
        address.insert("state_district".into(), district.clone());
        if let Some(taluk) = &self.taluk {
            address.insert("subdistrict".into(), taluk.clone());
        }
        if let Some(panchayat) = &self.panchayat {
            address.insert("panchayat".into(), panchayat.clone());
        }
        address.insert("state".into(), region.state.clone());
        address.insert("country".into(), region.country.clone());
        address.insert("country_code".into(), region.country_code.clone());
        if let Some(postcode) = self.postcode {
            address.insert("postcode".into(), postcode);
        }

        place.district = Some(district);
        place.taluk = self.taluk;
        place.panchayat = self.panchayat;
        place
    }
}
