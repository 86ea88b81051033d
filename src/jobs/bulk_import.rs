use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use super::{timestamp, RunReport};
use crate::config::Config;
use crate::extract::{candidates_from_export, fetch_export, PoiExport};
use crate::models::{Dataset, DatasetMeta};
use crate::reconcile::Region;
use crate::store::{read_json, require_input, save_dataset, InputKind};

/// Where the POI export comes from
#[derive(Debug, Clone)]
pub enum ExportSource {
    /// A saved Overpass JSON response (optionally gzipped)
    File(PathBuf),
    /// Query the configured Overpass endpoint
    Live,
}

/// Rebuild the dataset from a POI export, replacing the output file
pub async fn bulk_import(config: &Config, region: &Region, source: &ExportSource) -> Result<RunReport> {
    let export: PoiExport = match source {
        ExportSource::File(path) => {
            require_input(path, InputKind::PoiExport)?;
            info!("Reading POI export from {}", path.display());
            read_json(path, InputKind::PoiExport)?
        }
        ExportSource::Live => {
            let agent = match config.geocoder.user_agent.trim() {
                "" => concat!("gazetteer/", env!("CARGO_PKG_VERSION")),
                agent => agent,
            };
            fetch_export(&config.overpass, agent).await?
        }
    };

    let mut report = RunReport::new("bulk-import");
    report.processed = export.elements.len();

    let candidates = candidates_from_export(&export, region);
    report.skipped = report.processed - candidates.len();

    let places: Vec<_> = candidates
        .into_iter()
        .map(|c| c.into_place(region))
        .collect();
    report.added = places.len();

    let mut dataset = Dataset {
        meta: DatasetMeta {
            generated_at: Some(timestamp()),
            count: Some(places.len()),
            ..DatasetMeta::default()
        },
        places,
    };

    let output = config.paths.output();
    save_dataset(output, &mut dataset)
        .with_context(|| format!("Failed to write dataset {}", output.display()))?;
    info!("Saved {} places to {}", dataset.places.len(), output.display());

    Ok(report)
}
