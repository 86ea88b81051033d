//! Name → places lookup, rebuilt at the start of every run.

use hashbrown::HashMap;

use super::Region;
use crate::models::Place;

/// Normalized name key → positions of every place sharing it.
///
/// Collisions accumulate: one village name can exist in several districts.
#[derive(Debug, Default)]
pub struct NameIndex {
    entries: HashMap<String, Vec<usize>>,
}

impl NameIndex {
    pub fn build(region: &Region, places: &[Place]) -> Self {
        let mut index = Self::default();
        for (i, place) in places.iter().enumerate() {
            index.insert(region.normalize_name(&place.name), i);
        }
        index
    }

    /// Record `position` under `key`; blank keys are not indexed
    pub fn insert(&mut self, key: String, position: usize) {
        if key.is_empty() {
            return;
        }
        self.entries.entry(key).or_default().push(position);
    }

    /// Positions of places sharing `key`, in dataset order
    pub fn get(&self, key: &str) -> &[usize] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if some place under `key` is attributed to the target district
    pub fn has_target(&self, key: &str, places: &[Place], region: &Region) -> bool {
        self.get(key).iter().any(|&i| {
            places
                .get(i)
                .and_then(|p| p.district.as_deref())
                .map_or(false, |d| region.matches_target(d))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
