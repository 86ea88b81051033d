use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use super::{progress_bar, timestamp, RunReport};
use crate::config::Config;
use crate::extract::load_curated;
use crate::geocode::{fallback_queries, GeocodeTransport, GeocodingClient};
use crate::pip::{load_boundaries, BoundaryIndex};
use crate::reconcile::{reconcile_candidates, NameIndex, Outcome, Region};
use crate::store::{load_dataset, require_input, save_dataset, write_json_atomic, InputKind};

#[derive(Debug, Clone)]
pub struct GapFillOptions {
    pub curated: PathBuf,
    /// Write the unresolved names and reasons here as JSON
    pub unresolved_out: Option<PathBuf>,
    /// Recorded as `meta.referenceList`; defaults to the list's file name
    pub label: Option<String>,
}

/// Add curated names missing from the target district.
///
/// Each name is text-geocoded, the best candidate is cross-checked against
/// the boundary polygons, and only target-district results are inserted.
pub async fn gap_fill<T: GeocodeTransport>(
    config: &Config,
    region: &Region,
    client: &mut GeocodingClient<T>,
    options: &GapFillOptions,
) -> Result<RunReport> {
    let target = region
        .target
        .clone()
        .context("gap-fill needs a target district (region.target or --target)")?;
    let dataset_path = &config.paths.dataset;
    require_input(dataset_path, InputKind::Dataset)?;
    require_input(&options.curated, InputKind::ReferenceList)?;
    require_input(&config.paths.boundaries, InputKind::Boundaries)?;

    let mut dataset = load_dataset(dataset_path)?;
    let curated = load_curated(&options.curated, region)?;
    let index = BoundaryIndex::build(load_boundaries(&config.paths.boundaries)?);
    let mut names = NameIndex::build(region, &dataset.places);
    info!(
        "Gap-filling {} curated names into {} ({} places, {} keys)",
        curated.len(),
        target,
        dataset.places.len(),
        names.len()
    );

    let mut report = RunReport::new("gap-fill");
    let pb = progress_bar(curated.len())?;
    for candidate in &curated {
        pb.inc(1);
        let key = region.normalize_name(&candidate.name);
        if names.has_target(&key, &dataset.places, region) {
            debug!("{} already present", candidate.name);
            report.skipped += 1;
            continue;
        }
        report.processed += 1;
        pb.set_message(candidate.name.clone());

        let queries = fallback_queries(region, &candidate.name);
        let results = client.search_by_text(&queries).await;
        match reconcile_candidates(region, &candidate.name, results, Some(&index)) {
            Outcome::Accepted(place) => {
                info!("Added {} ({}, {})", place.name, place.lat, place.lon);
                dataset.places.push(place);
                names.insert(key, dataset.places.len() - 1);
                report.added += 1;
            }
            Outcome::Unresolved(unresolved) => {
                debug!("{} unresolved: {}", unresolved.name, unresolved.reason);
                report.unresolved.push(unresolved);
            }
        }
    }
    pb.finish_and_clear();

    if report.added > 0 {
        let label = options.label.clone().unwrap_or_else(|| {
            options
                .curated
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        dataset.meta.enriched_at = Some(timestamp());
        dataset.meta.count = Some(dataset.places.len());
        dataset
            .meta
            .extra
            .insert("referenceList".to_string(), Value::String(label));

        let output = config.paths.output();
        save_dataset(output, &mut dataset)
            .with_context(|| format!("Failed to write dataset {}", output.display()))?;
        info!("Saved {} places to {}", dataset.places.len(), output.display());
    } else {
        info!("No new places; dataset left untouched");
    }

    if let Some(path) = &options.unresolved_out {
        write_json_atomic(path, &report.unresolved)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(report)
}
