//! Reconciliation of geocoder candidates, boundary verdicts and dataset records.
//!
//! District precedence: boundary polygon first, geocoder address second.
//! Nothing here guesses: a record that cannot be attributed is reported as
//! unresolved and left as it was.

mod name_index;
mod region;

use std::fmt;

use crate::models::{AddressMap, AdminField, GeocodeResult, Place};
use crate::pip::BoundaryIndex;

pub use name_index::NameIndex;
pub use region::Region;

/// Where a resolved district came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistrictSource {
    Boundary,
    Geocoder,
}

/// Why a record could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// Geocoder returned nothing (or retries were exhausted)
    NoGeocodeResult,
    /// No usable coordinates on the record or the chosen candidate
    NoCoordinates,
    /// Neither a boundary polygon nor the address named a district
    NoDistrict,
    /// A district was found, but it is not the target
    WrongRegion { district: String },
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::NoGeocodeResult => write!(f, "no geocode result"),
            UnresolvedReason::NoCoordinates => write!(f, "no usable coordinates"),
            UnresolvedReason::NoDistrict => write!(f, "no boundary or address match"),
            UnresolvedReason::WrongRegion { district } => write!(f, "resolved to {}", district),
        }
    }
}

/// A name that could not be resolved, with the reason
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Unresolved {
    pub name: String,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: UnresolvedReason,
}

fn serialize_reason<S: serde::Serializer>(
    reason: &UnresolvedReason,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

/// Result of reconciling one input name
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted(Place),
    Unresolved(Unresolved),
}

/// Result of re-enriching one existing record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    /// District already valid; the record was not touched
    AlreadyResolved,
    /// District set to this canonical name
    Resolved(String),
    Unresolved(UnresolvedReason),
}

/// A geocoder candidate with its match score
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub result: GeocodeResult,
    pub score: u32,
}

/// +2 for a matching state, +3 for a matching target district
pub fn score_candidate(region: &Region, result: &GeocodeResult) -> u32 {
    let mut score = 0;
    if result
        .address
        .get("state")
        .map_or(false, |s| region.matches_state(s))
    {
        score += 2;
    }
    if AdminField::District
        .from_address(&result.address)
        .map_or(false, |d| region.matches_target(d))
    {
        score += 3;
    }
    score
}

/// Rank by descending score; equal scores keep input order
pub fn rank_candidates(region: &Region, results: Vec<GeocodeResult>) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = results
        .into_iter()
        .map(|result| ScoredCandidate {
            score: score_candidate(region, &result),
            result,
        })
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// Boundary verdict wins over the geocoder's address; the result is canonical
pub fn determine_district(
    region: &Region,
    boundary: Option<&str>,
    address: &AddressMap,
) -> Option<(String, DistrictSource)> {
    let (raw, source) = match boundary.map(str::trim).filter(|b| !b.is_empty()) {
        Some(b) => (b, DistrictSource::Boundary),
        None => (AdminField::District.from_address(address)?, DistrictSource::Geocoder),
    };
    if region.is_placeholder(raw) {
        return None;
    }
    Some((region.canonical_district(raw), source))
}

/// Decide whether a curated name can be added under the target district.
///
/// The top-ranked candidate's coordinates are cross-checked against the
/// boundary index; the final district must match the target.
pub fn reconcile_candidates(
    region: &Region,
    name: &str,
    candidates: Vec<GeocodeResult>,
    boundaries: Option<&BoundaryIndex>,
) -> Outcome {
    let unresolved = |reason| {
        Outcome::Unresolved(Unresolved {
            name: name.to_string(),
            reason,
        })
    };

    let Some(best) = rank_candidates(region, candidates).into_iter().next() else {
        return unresolved(UnresolvedReason::NoGeocodeResult);
    };
    let best = best.result;

    let Some((lon, lat)) = best.point() else {
        return unresolved(UnresolvedReason::NoCoordinates);
    };

    let boundary = boundaries.and_then(|index| index.resolve(lon, lat));
    let Some((district, _)) = determine_district(region, boundary, &best.address) else {
        return unresolved(UnresolvedReason::NoDistrict);
    };
    if !region.matches_target(&district) {
        return unresolved(UnresolvedReason::WrongRegion { district });
    }

    let clean_name = region.strip_qualifier(name);
    let mut place = Place::new(
        clean_name.clone(),
        best.lat.clone().unwrap_or_default(),
        best.lon.clone().unwrap_or_default(),
    );
    place.display_name = best.display_name.clone().unwrap_or_else(|| {
        format!("{}, {}, {}, {}", clean_name, district, region.state, region.country)
    });
    place.taluk = AdminField::Taluk.from_address(&best.address).map(str::to_string);
    place.panchayat = AdminField::Panchayat
        .from_address(&best.address)
        .map(str::to_string);
    place.district = Some(district);
    place.raw_address = best.address;

    Outcome::Accepted(place)
}

/// Resolve a record's district from boundary polygons only.
///
/// Records with a valid district are left untouched. The boundary name is
/// added to the address map as `state_district` unless one is already there.
pub fn enrich_from_boundary(region: &Region, place: &mut Place, index: &BoundaryIndex) -> Enrichment {
    if !region.needs_district(place) {
        return Enrichment::AlreadyResolved;
    }
    let Some((lon, lat)) = place.point() else {
        return Enrichment::Unresolved(UnresolvedReason::NoCoordinates);
    };
    let Some(boundary) = index.resolve(lon, lat) else {
        return Enrichment::Unresolved(UnresolvedReason::NoDistrict);
    };
    let Some((district, _)) = determine_district(region, Some(boundary), &AddressMap::new()) else {
        return Enrichment::Unresolved(UnresolvedReason::NoDistrict);
    };

    place
        .raw_address
        .entry("state_district".to_string())
        .or_insert_with(|| boundary.to_string());
    place.district = Some(district.clone());
    Enrichment::Resolved(district)
}

/// Resolve a record's district from a reverse-geocoded address.
///
/// Taluk and panchayat are only filled when absent; the address is merged
/// into the record's components even when no district is found.
pub fn enrich_from_address(region: &Region, place: &mut Place, address: &AddressMap) -> Enrichment {
    if !region.needs_district(place) {
        return Enrichment::AlreadyResolved;
    }
    if address.is_empty() {
        return Enrichment::Unresolved(UnresolvedReason::NoGeocodeResult);
    }

    if place.taluk.is_none() {
        place.taluk = AdminField::Taluk.from_address(address).map(str::to_string);
    }
    if place.panchayat.is_none() {
        place.panchayat = AdminField::Panchayat.from_address(address).map(str::to_string);
    }
    place.merge_address(address);

    match determine_district(region, None, address) {
        Some((district, _)) => {
            place.district = Some(district.clone());
            Enrichment::Resolved(district)
        }
        None => Enrichment::Unresolved(UnresolvedReason::NoDistrict),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionConfig;
    use crate::pip::BoundaryFeature;
    use geo_types::{Geometry, LineString, Polygon};

    fn region() -> Region {
        Region::from_config(&RegionConfig {
            target: Some("Thoothukkudi".to_string()),
            ..RegionConfig::default()
        })
        .unwrap()
    }

    fn candidate(lat: &str, lon: &str, fields: &[(&str, &str)]) -> GeocodeResult {
        GeocodeResult {
            display_name: Some(format!("{lat},{lon}")),
            lat: Some(lat.to_string()),
            lon: Some(lon.to_string()),
            address: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn square_index(name: &str, min: f64, max: f64) -> BoundaryIndex {
        let ring = LineString::from(vec![(min, min), (min, max), (max, max), (max, min), (min, min)]);
        BoundaryIndex::build(vec![BoundaryFeature::new(
            name,
            Geometry::Polygon(Polygon::new(ring, vec![])),
        )])
    }

    #[test]
    fn test_scoring() {
        let r = region();
        let none = candidate("1", "1", &[("state", "Kerala")]);
        let state = candidate("1", "1", &[("state", "Tamil Nadu")]);
        let both = candidate(
            "1",
            "1",
            &[("state", "tamil nadu"), ("state_district", "Thoothukudi District")],
        );
        assert_eq!(score_candidate(&r, &none), 0);
        assert_eq!(score_candidate(&r, &state), 2);
        assert_eq!(score_candidate(&r, &both), 5);
    }

    #[test]
    fn test_rank_is_stable() {
        let r = region();
        let ranked = rank_candidates(
            &r,
            vec![
                candidate("1", "0", &[("state", "Tamil Nadu")]),
                candidate("2", "0", &[]),
                candidate("3", "0", &[("state", "Tamil Nadu")]),
                candidate("4", "0", &[("state", "Tamil Nadu"), ("district", "Thoothukkudi")]),
            ],
        );
        let order: Vec<_> = ranked
            .iter()
            .map(|c| c.result.lat.as_deref().unwrap())
            .collect();
        assert_eq!(order, ["4", "1", "3", "2"]);
    }

    #[test]
    fn test_boundary_takes_precedence() {
        let r = region();
        let mut addr = AddressMap::new();
        addr.insert("state_district".into(), "Tirunelveli".into());

        assert_eq!(
            determine_district(&r, Some("Thoothukudi"), &addr),
            Some(("Thoothukkudi".to_string(), DistrictSource::Boundary))
        );
        assert_eq!(
            determine_district(&r, None, &addr),
            Some(("Tirunelveli".to_string(), DistrictSource::Geocoder))
        );
        assert_eq!(determine_district(&r, None, &AddressMap::new()), None);
    }

    #[test]
    fn test_wrong_region_is_rejected_not_defaulted() {
        let r = region();
        let index = square_index("Tirunelveli", 0.0, 1.0);
        let outcome = reconcile_candidates(
            &r,
            "Puthur",
            vec![candidate("0.5", "0.5", &[("state_district", "Thoothukkudi")])],
            Some(&index),
        );
        assert_eq!(
            outcome,
            Outcome::Unresolved(Unresolved {
                name: "Puthur".to_string(),
                reason: UnresolvedReason::WrongRegion {
                    district: "Tirunelveli".to_string()
                },
            })
        );
    }

    #[test]
    fn test_accepts_matching_candidate() {
        let r = region();
        let index = square_index("Thoothukudi", 0.0, 1.0);
        let outcome = reconcile_candidates(
            &r,
            "Kayathar, Tamil Nadu",
            vec![
                candidate("5", "5", &[("state", "Kerala")]),
                candidate(
                    "0.5",
                    "0.25",
                    &[("state", "Tamil Nadu"), ("county", "Kayathar"), ("panchayat", "K")],
                ),
            ],
            Some(&index),
        );
        let Outcome::Accepted(place) = outcome else {
            panic!("expected acceptance");
        };
        assert_eq!(place.name, "Kayathar");
        assert_eq!(place.district.as_deref(), Some("Thoothukkudi"));
        assert_eq!(place.lat, "0.5");
        assert_eq!(place.lon, "0.25");
        assert_eq!(place.taluk.as_deref(), Some("Kayathar"));
        assert_eq!(place.panchayat.as_deref(), Some("K"));
    }

    #[test]
    fn test_unresolved_reasons() {
        let r = region();
        let empty = reconcile_candidates(&r, "A", vec![], None);
        assert!(matches!(
            empty,
            Outcome::Unresolved(Unresolved { reason: UnresolvedReason::NoGeocodeResult, .. })
        ));

        let no_coords = reconcile_candidates(&r, "A", vec![candidate("x", "", &[])], None);
        assert!(matches!(
            no_coords,
            Outcome::Unresolved(Unresolved { reason: UnresolvedReason::NoCoordinates, .. })
        ));

        let no_district = reconcile_candidates(&r, "A", vec![candidate("1", "1", &[])], None);
        assert!(matches!(
            no_district,
            Outcome::Unresolved(Unresolved { reason: UnresolvedReason::NoDistrict, .. })
        ));
    }

    #[test]
    fn test_boundary_enrichment_is_idempotent() {
        let r = region();
        let index = square_index("North", 0.0, 1.0);
        let mut place = Place::new("A", "0.5", "0.5");
        place.district = Some("Tamil Nadu".to_string());
        place.raw_address.insert("village".into(), "A".into());

        assert_eq!(
            enrich_from_boundary(&r, &mut place, &index),
            Enrichment::Resolved("North".to_string())
        );
        assert_eq!(place.raw_address["state_district"], "North");
        assert_eq!(place.raw_address["village"], "A");

        let snapshot = place.clone();
        assert_eq!(
            enrich_from_boundary(&r, &mut place, &index),
            Enrichment::AlreadyResolved
        );
        assert_eq!(place, snapshot);
    }

    #[test]
    fn test_boundary_enrichment_keeps_existing_state_district() {
        let r = region();
        let index = square_index("North", 0.0, 1.0);
        let mut place = Place::new("A", "0.5", "0.5");
        place.raw_address.insert("state_district".into(), "Old".into());
        enrich_from_boundary(&r, &mut place, &index);
        assert_eq!(place.raw_address["state_district"], "Old");
        assert_eq!(place.district.as_deref(), Some("North"));
    }

    #[test]
    fn test_address_enrichment() {
        let r = region();
        let mut place = Place::new("A", "1", "1");
        place.taluk = Some("Existing".to_string());

        let mut addr = AddressMap::new();
        addr.insert("state_district".into(), "Thoothukudi".into());
        addr.insert("subdistrict".into(), "Other".into());
        addr.insert("village_panchayat".into(), "VP".into());

        assert_eq!(
            enrich_from_address(&r, &mut place, &addr),
            Enrichment::Resolved("Thoothukkudi".to_string())
        );
        assert_eq!(place.taluk.as_deref(), Some("Existing"));
        assert_eq!(place.panchayat.as_deref(), Some("VP"));
        assert_eq!(place.raw_address.len(), 3);

        let snapshot = place.clone();
        assert_eq!(enrich_from_address(&r, &mut place, &addr), Enrichment::AlreadyResolved);
        assert_eq!(place, snapshot);
    }

    #[test]
    fn test_address_enrichment_rejects_placeholder() {
        let r = region();
        let mut place = Place::new("A", "1", "1");
        let mut addr = AddressMap::new();
        addr.insert("region".into(), "Tamil Nadu".into());
        assert_eq!(
            enrich_from_address(&r, &mut place, &addr),
            Enrichment::Unresolved(UnresolvedReason::NoDistrict)
        );
        assert!(place.district.is_none());
        assert_eq!(place.raw_address["region"], "Tamil Nadu");

        assert_eq!(
            enrich_from_address(&r, &mut place, &AddressMap::new()),
            Enrichment::Unresolved(UnresolvedReason::NoGeocodeResult)
        );
    }
}
