//! Live POI export from an Overpass interpreter.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;
use url::Url;

use super::PoiExport;
use crate::config::OverpassConfig;

/// Overpass QL selecting `place=*` nodes of the configured kinds in the area
pub fn build_query(config: &OverpassConfig) -> String {
    format!(
        "[out:json][timeout:{}];\narea(id:{})->.searchArea;\n(\n  node[\"place\"~\"{}\"](area.searchArea);\n);\nout body;\n",
        config.timeout_secs,
        config.area_id,
        config.place_kinds.join("|")
    )
}

/// Fetch the export over HTTP
pub async fn fetch_export(config: &OverpassConfig, user_agent: &str) -> Result<PoiExport> {
    let client = Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_secs + 20))
        .build()
        .context("Failed to create HTTP client")?;

    let mut url = Url::parse(&config.url)
        .with_context(|| format!("Invalid Overpass URL {}", config.url))?;
    url.query_pairs_mut().append_pair("data", &build_query(config));

    info!("Fetching POI export from {} (this may take a minute)", config.url);
    let response = client
        .get(url)
        .send()
        .await
        .context("Overpass request failed")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Overpass returned {}: {}", status, body);
    }

    let export: PoiExport = response
        .json()
        .await
        .context("Failed to decode Overpass response")?;
    info!("Received {} elements", export.elements.len());
    Ok(export)
}
