use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{progress_bar, timestamp, RunReport};
use crate::config::Config;
use crate::geocode::{GeocodeTransport, GeocodingClient};
use crate::models::Dataset;
use crate::reconcile::{enrich_from_address, Enrichment, Region, Unresolved, UnresolvedReason};
use crate::store::{load_dataset, require_input, save_dataset, InputKind};

/// Resolve missing/placeholder districts by reverse geocoding.
///
/// Dataset and geocode cache are flushed every `checkpoint.every` records, so
/// an interrupted run resumes where the last checkpoint left off.
pub async fn enrich_online<T: GeocodeTransport>(
    config: &Config,
    region: &Region,
    client: &mut GeocodingClient<T>,
) -> Result<RunReport> {
    let dataset_path = &config.paths.dataset;
    require_input(dataset_path, InputKind::Dataset)?;
    let mut dataset = load_dataset(dataset_path)?;

    // Positions stay valid across checkpoints: names never change and the
    // sort is stable.
    dataset.sort();
    let pending: Vec<usize> = dataset
        .places
        .iter()
        .enumerate()
        .filter(|(_, p)| region.needs_district(p))
        .map(|(i, _)| i)
        .collect();

    let mut report = RunReport::new("enrich-online");
    report.skipped = dataset.places.len() - pending.len();
    info!(
        "{} of {} places need a district",
        pending.len(),
        dataset.places.len()
    );

    let output = config.paths.output();
    let every = config.checkpoint.every.max(1);
    let pb = progress_bar(pending.len())?;

    for (done, &i) in pending.iter().enumerate() {
        let place = &mut dataset.places[i];
        pb.set_message(place.name.clone());
        report.processed += 1;

        let outcome = match place.point() {
            None => Enrichment::Unresolved(UnresolvedReason::NoCoordinates),
            Some(_) => {
                let (lat, lon) = (place.lat.clone(), place.lon.clone());
                match client.reverse(&lat, &lon).await {
                    Some(result) => enrich_from_address(region, place, &result.address),
                    None => Enrichment::Unresolved(UnresolvedReason::NoGeocodeResult),
                }
            }
        };
        match outcome {
            Enrichment::Resolved(district) => {
                debug!("{} -> {}", place.name, district);
                report.updated += 1;
            }
            Enrichment::Unresolved(reason) => report.unresolved.push(Unresolved {
                name: place.name.clone(),
                reason,
            }),
            Enrichment::AlreadyResolved => report.skipped += 1,
        }
        pb.inc(1);

        if (done + 1) % every == 0 {
            checkpoint(output, &mut dataset, client)?;
            info!(
                "Checkpoint: {}/{} processed, {} updated, {} requests sent",
                done + 1,
                pending.len(),
                report.updated,
                client.requests_sent()
            );
        }
    }
    pb.finish_and_clear();

    checkpoint(output, &mut dataset, client)?;
    Ok(report)
}

fn checkpoint<T: GeocodeTransport>(
    output: &Path,
    dataset: &mut Dataset,
    client: &mut GeocodingClient<T>,
) -> Result<()> {
    dataset.meta.enriched_at = Some(timestamp());
    save_dataset(output, dataset)
        .with_context(|| format!("Failed to write dataset {}", output.display()))?;
    client
        .cache_mut()
        .save()
        .context("Failed to write geocode cache")?;
    Ok(())
}
