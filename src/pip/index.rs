//! Boundary index for point → district lookups.

use std::sync::atomic::{AtomicUsize, Ordering};

use geo_types::Coord;
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use super::BoundaryFeature;

/// R-tree entry pointing back at a feature by its input position
struct IndexedFeature {
    ordinal: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Ordered set of boundary features with a bounding-box pre-filter.
///
/// The R-tree only narrows the candidates. Candidates are tested in input
/// order and the first containing feature wins, so overlapping slivers between
/// neighbours always resolve the same way for a given boundary file.
pub struct BoundaryIndex {
    features: Vec<BoundaryFeature>,
    tree: RTree<IndexedFeature>,
    exact_tests: AtomicUsize,
}

impl BoundaryIndex {
    /// Build the index, preserving feature order
    pub fn build(features: Vec<BoundaryFeature>) -> Self {
        info!("Building boundary index for {} features...", features.len());

        // Features with an empty box can never contain a point
        let indexed: Vec<IndexedFeature> = features
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.bbox.is_empty())
            .map(|(ordinal, f)| IndexedFeature {
                ordinal,
                envelope: AABB::from_corners(
                    [f.bbox.min_x, f.bbox.min_y],
                    [f.bbox.max_x, f.bbox.max_y],
                ),
            })
            .collect();

        let tree = RTree::bulk_load(indexed);
        info!("Boundary index built with {} entries", tree.size());

        Self {
            features,
            tree,
            exact_tests: AtomicUsize::new(0),
        }
    }

    /// Name of the first feature (in input order) containing the point
    pub fn resolve(&self, lon: f64, lat: f64) -> Option<&str> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        let point = Coord { x: lon, y: lat };

        let mut candidates: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_point([lon, lat]))
            .map(|entry| entry.ordinal)
            .collect();
        candidates.sort_unstable();

        candidates
            .into_iter()
            .map(|ordinal| &self.features[ordinal])
            .find(|feature| {
                self.exact_tests.fetch_add(1, Ordering::Relaxed);
                feature.contains(point)
            })
            .map(|feature| feature.name.as_str())
    }

    /// Number of exact polygon tests performed so far
    pub fn exact_tests(&self) -> usize {
        self.exact_tests.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features in index order
    pub fn features(&self) -> impl Iterator<Item = &BoundaryFeature> {
        self.features.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Geometry, LineString, Polygon};

    fn rect(name: &str, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundaryFeature {
        let ring = LineString::from(vec![
            (min_x, min_y),
            (min_x, max_y),
            (max_x, max_y),
            (max_x, min_y),
            (min_x, min_y),
        ]);
        BoundaryFeature::new(name, Geometry::Polygon(Polygon::new(ring, vec![])))
    }

    #[test]
    fn test_resolve_unit_square() {
        let index = BoundaryIndex::build(vec![rect("North", 0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(index.resolve(0.5, 0.5), Some("North"));
        assert_eq!(index.resolve(2.0, 2.0), None);
    }

    #[test]
    fn test_bbox_prefilter_skips_exact_test() {
        let index = BoundaryIndex::build(vec![
            rect("A", 0.0, 0.0, 1.0, 1.0),
            rect("B", 10.0, 10.0, 11.0, 11.0),
        ]);
        for &(x, y) in &[(5.0, 5.0), (-3.0, 0.5), (0.5, 20.0), (12.0, 10.5)] {
            assert_eq!(index.resolve(x, y), None);
        }
        assert_eq!(index.exact_tests(), 0);

        assert_eq!(index.resolve(10.5, 10.5), Some("B"));
        assert_eq!(index.exact_tests(), 1);
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        let index = BoundaryIndex::build(vec![
            rect("Second", 0.5, 0.0, 2.0, 1.0),
            rect("First", 0.0, 0.0, 1.0, 1.0),
        ]);
        // Overlap region: input order decides, every time
        for _ in 0..3 {
            assert_eq!(index.resolve(0.75, 0.5), Some("Second"));
        }
        assert_eq!(index.resolve(0.25, 0.5), Some("First"));
    }

    #[test]
    fn test_non_finite_point() {
        let index = BoundaryIndex::build(vec![rect("A", 0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(index.resolve(f64::NAN, 0.5), None);
        assert_eq!(index.exact_tests(), 0);
    }

    #[test]
    fn test_empty_index() {
        let index = BoundaryIndex::build(vec![]);
        assert!(index.is_empty());
        assert_eq!(index.resolve(0.0, 0.0), None);
    }
}
