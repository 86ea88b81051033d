use std::path::Path;

use hashbrown::HashSet;
use serde_json::Value;
use tracing::info;

use super::Candidate;
use crate::reconcile::Region;
use crate::store::{read_text, InputKind, StoreError};

/// Load a curated reference list (JSON array or one name per line)
pub fn load_curated(path: &Path, region: &Region) -> Result<Vec<Candidate>, StoreError> {
    let text = read_text(path, InputKind::ReferenceList)?;
    let names = parse_curated(&text, region);
    info!("Loaded {} curated names from {}", names.len(), path.display());
    Ok(names)
}

/// Parse list text, dropping blanks, `#` comments and merge-key duplicates.
/// Input order is kept.
pub fn parse_curated(text: &str, region: &Region) -> Vec<Candidate> {
    let raw: Vec<String> = match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.starts_with('#'))
            .map(str::to_string)
            .collect(),
    };

    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .filter(|name| {
            let key = region.normalize_name(name);
            !key.is_empty() && seen.insert(key)
        })
        .map(Candidate::named)
        .collect()
}
