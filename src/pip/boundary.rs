//! Administrative boundary features decoded from a GeoJSON collection.

use std::path::Path;

use anyhow::Result;
use geo_types::{Coord, Geometry};
use serde_json::Value;
use tracing::{debug, info};

use super::geometry::{geometry_from_geojson, point_in_geometry, BoundingBox};
use crate::store::{read_json, InputKind};

/// A single named administrative polygon
#[derive(Debug, Clone)]
pub struct BoundaryFeature {
    /// District label (`properties.shapeName`)
    pub name: String,
    pub bbox: BoundingBox,
    pub geometry: Geometry<f64>,
}

impl BoundaryFeature {
    pub fn new(name: impl Into<String>, geometry: Geometry<f64>) -> Self {
        Self {
            name: name.into(),
            bbox: BoundingBox::of(&geometry),
            geometry,
        }
    }

    /// Exact containment test (no bbox shortcut)
    pub fn contains(&self, point: Coord<f64>) -> bool {
        point_in_geometry(point, &self.geometry)
    }
}

/// Decode features from a parsed GeoJSON document, keeping input order.
///
/// Features without a `shapeName` or without a (multi)polygon geometry are
/// skipped.
pub fn features_from_geojson(doc: &Value) -> Vec<BoundaryFeature> {
    let Some(features) = doc.get("features").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let name = feature
            .get("properties")
            .and_then(|p| p.get("shapeName"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let geometry = feature.get("geometry").and_then(geometry_from_geojson);

        match (name, geometry) {
            (Some(name), Some(geometry)) => out.push(BoundaryFeature::new(name, geometry)),
            _ => debug!("Skipping boundary feature #{} (missing name or geometry)", i),
        }
    }
    out
}

/// Load boundary features from a GeoJSON file (`.gz` accepted)
pub fn load_boundaries(path: &Path) -> Result<Vec<BoundaryFeature>> {
    info!("Loading boundaries from {}", path.display());
    let doc: Value = read_json(path, InputKind::Boundaries)?;
    let features = features_from_geojson(&doc);
    info!("Loaded {} boundary polygons", features.len());
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_skips_incomplete_features() {
        let doc = json!({
            "features": [
                { "properties": { "shapeName": "North" },
                  "geometry": { "type": "Polygon", "coordinates": [[[0,0],[0,1],[1,1],[1,0],[0,0]]] } },
                { "properties": {},
                  "geometry": { "type": "Polygon", "coordinates": [[[0,0],[0,1],[1,1],[1,0],[0,0]]] } },
                { "properties": { "shapeName": "NoGeometry" } },
                { "properties": { "shapeName": "Line" },
                  "geometry": { "type": "LineString", "coordinates": [[0,0],[1,1]] } },
                { "properties": { "shapeName": "South" },
                  "geometry": { "type": "MultiPolygon", "coordinates": [[[[0,-1],[0,0],[1,0],[1,-1],[0,-1]]]] } }
            ]
        });
        let features = features_from_geojson(&doc);
        let names: Vec<_> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["North", "South"]);
        assert_eq!(features[0].bbox.max_x, 1.0);
        assert!(features[0].contains(Coord { x: 0.5, y: 0.5 }));
    }

    #[test]
    fn test_missing_features_array() {
        assert!(features_from_geojson(&json!({ "type": "FeatureCollection" })).is_empty());
    }
}
