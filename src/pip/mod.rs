//! Point-in-Polygon (PIP) district resolution.
//!
//! Loads administrative boundary polygons and resolves points to district
//! names, with an R-tree bounding-box pre-filter in front of exact ray casting.

mod boundary;
pub mod geometry;
mod index;

pub use boundary::{features_from_geojson, load_boundaries, BoundaryFeature};
pub use geometry::BoundingBox;
pub use index::BoundaryIndex;
