//! Batch jobs. Each mode is a linear pipeline over the dataset file; retries
//! happen only inside the geocoding client.

mod audit;
mod bulk_import;
mod gap_fill;
mod offline;
mod online;
mod report;

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use indicatif::{ProgressBar, ProgressStyle};

pub use audit::audit;
pub use bulk_import::{bulk_import, ExportSource};
pub use gap_fill::{gap_fill, GapFillOptions};
pub use offline::{enrich_offline, BOUNDARY_SOURCE};
pub use online::enrich_online;
pub use report::{AuditReport, Mismatch, RunReport};

/// ISO-8601 UTC timestamp for dataset metadata
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
