//! Point-in-polygon geometry engine.
//!
//! Containment is even-odd ray casting with half-open edges, so a point on an
//! edge shared by two adjacent polygons is counted in exactly one of them.
//! Every test here is total: malformed input is "not contained", never an error.

use geo::CoordsIter;
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use serde_json::Value;

/// Axis-aligned bounding box in lon/lat space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Box of an empty geometry: inverted, so nothing is ever inside it
    pub const EMPTY: BoundingBox = BoundingBox {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    /// Bounding box over every vertex of every ring, holes included
    pub fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Polygon(polygon) => Self::from_coords(polygon.coords_iter()),
            Geometry::MultiPolygon(polygons) => Self::from_coords(polygons.coords_iter()),
            _ => Self::EMPTY,
        }
    }

    fn from_coords(coords: impl Iterator<Item = Coord<f64>>) -> Self {
        coords.fold(Self::EMPTY, |mut bbox, c| {
            if c.x.is_finite() && c.y.is_finite() {
                bbox.min_x = bbox.min_x.min(c.x);
                bbox.min_y = bbox.min_y.min(c.y);
                bbox.max_x = bbox.max_x.max(c.x);
                bbox.max_y = bbox.max_y.max(c.y);
            }
            bbox
        })
    }

    pub fn is_empty(&self) -> bool {
        !(self.min_x <= self.max_x && self.min_y <= self.max_y)
    }

    /// Inclusive containment; always false for an empty box
    pub fn contains(&self, point: Coord<f64>) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

/// Crossing-number test against one ring
pub fn point_in_ring(point: Coord<f64>, ring: &LineString<f64>) -> bool {
    let coords = &ring.0;
    let n = coords.len();
    if n == 0 {
        return false;
    }

    let (x, y) = (point.x, point.y);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let Coord { x: xi, y: yi } = coords[i];
        let Coord { x: xj, y: yj } = coords[j];
        // (yi > y) != (yj > y) implies yi != yj, so the division is safe
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Inside the exterior ring and outside every hole
pub fn point_in_polygon(point: Coord<f64>, polygon: &Polygon<f64>) -> bool {
    point_in_ring(point, polygon.exterior())
        && !polygon
            .interiors()
            .iter()
            .any(|hole| point_in_ring(point, hole))
}

/// Inside any constituent polygon
pub fn point_in_multi_polygon(point: Coord<f64>, polygons: &MultiPolygon<f64>) -> bool {
    polygons.iter().any(|polygon| point_in_polygon(point, polygon))
}

/// Dispatch on geometry kind; anything other than (multi)polygons contains nothing
pub fn point_in_geometry(point: Coord<f64>, geometry: &Geometry<f64>) -> bool {
    match geometry {
        Geometry::Polygon(polygon) => point_in_polygon(point, polygon),
        Geometry::MultiPolygon(polygons) => point_in_multi_polygon(point, polygons),
        _ => false,
    }
}

/// Decode a GeoJSON geometry object into a typed (multi)polygon.
///
/// Returns `None` for missing or unsupported geometry types. Coordinates are
/// read leniently: entries that are not `[x, y, ..]` number pairs are skipped
/// and a ring that is not an array becomes an empty ring.
pub fn geometry_from_geojson(value: &Value) -> Option<Geometry<f64>> {
    let kind = value.get("type")?.as_str()?;
    let coordinates = value.get("coordinates");
    match kind {
        "Polygon" => Some(Geometry::Polygon(polygon_from_value(coordinates))),
        "MultiPolygon" => {
            let polygons = coordinates
                .and_then(Value::as_array)
                .map(|items| items.iter().map(|p| polygon_from_value(Some(p))).collect())
                .unwrap_or_default();
            Some(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
        }
        _ => None,
    }
}

fn polygon_from_value(value: Option<&Value>) -> Polygon<f64> {
    let mut rings = value
        .and_then(Value::as_array)
        .map(|items| items.iter().map(ring_from_value).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter();

    // A polygon without rings gets an empty exterior and contains nothing
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.collect())
}

fn ring_from_value(value: &Value) -> LineString<f64> {
    let coords = value
        .as_array()
        .map(|items| items.iter().filter_map(position_from_value).collect())
        .unwrap_or_default();
    LineString::new(coords)
}

fn position_from_value(value: &Value) -> Option<Coord<f64>> {
    let items = value.as_array()?;
    let x = items.first()?.as_f64()?;
    let y = items.get(1)?.as_f64()?;
    Some(Coord { x, y })
}
