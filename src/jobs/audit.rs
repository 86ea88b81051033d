use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};

use super::{AuditReport, Mismatch};
use crate::config::Config;
use crate::extract::load_curated;
use crate::reconcile::{NameIndex, Region};
use crate::store::{load_dataset, require_input, InputKind};

const UNKNOWN_DISTRICT: &str = "UNKNOWN";

/// Compare a curated list against the dataset. Nothing is written.
///
/// A name is found when any record carries it. Independently, it is
/// mismatched when any of those records sits outside the target district.
pub fn audit(config: &Config, region: &Region, curated: &Path) -> Result<AuditReport> {
    let target = region
        .target
        .clone()
        .context("audit needs a target district (region.target or --target)")?;
    require_input(&config.paths.dataset, InputKind::Dataset)?;
    require_input(curated, InputKind::ReferenceList)?;

    let dataset = load_dataset(&config.paths.dataset)?;
    let names = NameIndex::build(region, &dataset.places);
    let curated = load_curated(curated, region)?;

    let mut report = AuditReport {
        target,
        total: curated.len(),
        ..AuditReport::default()
    };

    for candidate in curated {
        let positions = names.get(&region.normalize_name(&candidate.name));
        if positions.is_empty() {
            report.missing.push(candidate.name);
            continue;
        }

        let elsewhere: BTreeSet<String> = positions
            .iter()
            .filter_map(|&i| {
                let district = dataset.places[i].district.as_deref().map(str::trim);
                match district {
                    Some(d) if region.matches_target(d) => None,
                    Some(d) if !d.is_empty() => Some(d.to_string()),
                    _ => Some(UNKNOWN_DISTRICT.to_string()),
                }
            })
            .collect();

        if !elsewhere.is_empty() {
            report.mismatched.push(Mismatch {
                name: candidate.name.clone(),
                districts: elsewhere.into_iter().collect(),
            });
        }
        report.found.push(candidate.name);
    }

    Ok(report)
}
