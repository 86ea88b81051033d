use anyhow::{Context, Result};
use tracing::info;

use super::{timestamp, RunReport};
use crate::config::Config;
use crate::pip::{load_boundaries, BoundaryIndex};
use crate::reconcile::{enrich_from_boundary, Enrichment, Region, Unresolved};
use crate::store::{load_dataset, require_input, save_dataset, InputKind};

/// Provenance label of the default boundary set
pub const BOUNDARY_SOURCE: &str = "geoBoundaries gbOpen ADM2 (ODbL 1.0)";

/// Resolve missing/placeholder districts from boundary polygons only.
/// No network access.
pub fn enrich_offline(config: &Config, region: &Region) -> Result<RunReport> {
    let dataset_path = &config.paths.dataset;
    require_input(dataset_path, InputKind::Dataset)?;
    require_input(&config.paths.boundaries, InputKind::Boundaries)?;

    let mut dataset = load_dataset(dataset_path)?;
    let features = load_boundaries(&config.paths.boundaries)?;
    let index = BoundaryIndex::build(features);
    info!(
        "Loaded {} places and {} boundary features",
        dataset.places.len(),
        index.len()
    );

    let mut report = RunReport::new("enrich-offline");
    for place in dataset.places.iter_mut() {
        match enrich_from_boundary(region, place, &index) {
            Enrichment::AlreadyResolved => report.skipped += 1,
            Enrichment::Resolved(_) => {
                report.processed += 1;
                report.updated += 1;
            }
            Enrichment::Unresolved(reason) => {
                report.processed += 1;
                report.unresolved.push(Unresolved {
                    name: place.name.clone(),
                    reason,
                });
            }
        }
    }
    info!(
        "{} polygon tests for {} lookups",
        index.exact_tests(),
        report.processed
    );

    dataset.meta.enriched_at = Some(timestamp());
    dataset.meta.source = Some(BOUNDARY_SOURCE.to_string());

    let output = config.paths.output();
    save_dataset(output, &mut dataset)
        .with_context(|| format!("Failed to write dataset {}", output.display()))?;
    Ok(report)
}
