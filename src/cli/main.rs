//! Gazetteer batch jobs.
//!
//! Builds and maintains the place dataset: bulk import from a POI export,
//! offline and online district enrichment, gap-filling against a curated
//! list, and a read-only audit.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use gazetteer::config::Config;
use gazetteer::geocode::{GeocodeCache, GeocodingClient, NominatimTransport};
use gazetteer::jobs::{self, ExportSource, GapFillOptions, RunReport};
use gazetteer::notify::{DiscordWebhook, RunOutcome};
use gazetteer::reconcile::Region;

/// Unresolved names included in a notification
const NOTIFY_LIST_LIMIT: usize = 25;

#[derive(Parser, Debug)]
#[command(name = "gazetteer")]
#[command(about = "Build and enrich the place dataset")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dataset file to read
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Write results here instead of over the dataset
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Administrative boundary GeoJSON
    #[arg(long, global = true)]
    boundaries: Option<PathBuf>,

    /// Reverse-geocode cache file
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Target district for gap-fill and audit
    #[arg(long, global = true)]
    target: Option<String>,

    /// Geocoder User-Agent (contact details required by the usage policy)
    #[arg(long, global = true, env = "GAZETTEER_USER_AGENT")]
    user_agent: Option<String>,

    /// Discord webhook URL for run summaries (optional)
    #[arg(long, global = true)]
    discord_webhook: Option<String>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the dataset from a POI export
    BulkImport {
        /// Saved Overpass JSON export (.json or .json.gz)
        #[arg(long, conflicts_with = "live", required_unless_present = "live")]
        export: Option<PathBuf>,

        /// Query the Overpass endpoint instead of reading a file
        #[arg(long)]
        live: bool,

        /// Overpass interpreter URL
        #[arg(long)]
        overpass_url: Option<String>,
    },

    /// Resolve missing districts from boundary polygons (no network)
    EnrichOffline,

    /// Resolve missing districts by reverse geocoding
    EnrichOnline {
        /// Flush dataset and cache every N records
        #[arg(long)]
        checkpoint_every: Option<usize>,
    },

    /// Add curated names missing from the target district
    GapFill {
        /// Curated reference list (JSON array or one name per line)
        #[arg(long)]
        curated: Option<PathBuf>,

        /// Write unresolved names with reasons to this JSON file
        #[arg(long)]
        unresolved_out: Option<PathBuf>,

        /// Label recorded as the dataset's reference list
        #[arg(long)]
        label: Option<String>,
    },

    /// Compare a curated list against the dataset (read-only)
    Audit {
        #[arg(long)]
        curated: Option<PathBuf>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::BulkImport { .. } => "bulk-import",
            Command::EnrichOffline => "enrich-offline",
            Command::EnrichOnline { .. } => "enrich-online",
            Command::GapFill { .. } => "gap-fill",
            Command::Audit { .. } => "audit",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.global.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli)?;
    let region = Region::from_config(&config.region).context("Invalid region settings")?;

    let discord = cli
        .global
        .discord_webhook
        .as_ref()
        .map(|url| DiscordWebhook::new(url.clone()));

    let mode = cli.command.name();
    info!("Gazetteer {}", mode);
    info!("Dataset: {}", config.paths.dataset.display());

    match run(&cli.command, &config, &region).await {
        Ok(summary) => {
            if let Some(dw) = &discord {
                dw.report(mode, RunOutcome::Completed(&summary)).await;
            }
            Ok(())
        }
        Err(e) => {
            error!("{} failed: {:#}", mode, e);
            if let Some(dw) = &discord {
                dw.report(mode, RunOutcome::Failed(&format!("{:#}", e))).await;
            }
            Err(e)
        }
    }
}

/// Config file first, then command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.global.config.as_deref())?;
    let args = &cli.global;

    if let Some(path) = &args.dataset {
        config.paths.dataset = path.clone();
    }
    if let Some(path) = &args.output {
        config.paths.output = Some(path.clone());
    }
    if let Some(path) = &args.boundaries {
        config.paths.boundaries = path.clone();
    }
    if let Some(path) = &args.cache {
        config.paths.cache = path.clone();
    }
    if let Some(target) = &args.target {
        config.region.target = Some(target.clone());
    }
    if let Some(agent) = &args.user_agent {
        config.geocoder.user_agent = agent.clone();
    }

    match &cli.command {
        Command::BulkImport {
            overpass_url: Some(url),
            ..
        } => config.overpass.url = url.clone(),
        Command::EnrichOnline {
            checkpoint_every: Some(every),
        } => config.checkpoint.every = *every,
        _ => {}
    }
    Ok(config)
}

/// Run one job and return its summary text
async fn run(command: &Command, config: &Config, region: &Region) -> Result<String> {
    match command {
        Command::BulkImport { export, .. } => {
            let source = match export {
                Some(path) => ExportSource::File(path.clone()),
                None => ExportSource::Live,
            };
            let report = jobs::bulk_import(config, region, &source).await?;
            Ok(finish(&report, false))
        }
        Command::EnrichOffline => {
            let report = jobs::enrich_offline(config, region)?;
            Ok(finish(&report, false))
        }
        Command::EnrichOnline { .. } => {
            let transport = NominatimTransport::new(&config.geocoder, &region.country_code)
                .context("Cannot start online enrichment")?;
            let cache = GeocodeCache::load(&config.paths.cache);
            let mut client = GeocodingClient::from_config(transport, &config.geocoder, cache);

            let report = jobs::enrich_online(config, region, &mut client).await?;
            info!("{} geocoder requests sent", client.requests_sent());
            Ok(finish(&report, false))
        }
        Command::GapFill {
            curated,
            unresolved_out,
            label,
        } => {
            let curated = curated_path(curated, config)?;
            let transport = NominatimTransport::new(&config.geocoder, &region.country_code)
                .context("Cannot start gap-fill")?;
            let mut client =
                GeocodingClient::from_config(transport, &config.geocoder, GeocodeCache::in_memory());

            let options = GapFillOptions {
                curated,
                unresolved_out: unresolved_out.clone(),
                label: label.clone(),
            };
            let report = jobs::gap_fill(config, region, &mut client, &options).await?;
            info!("{} geocoder requests sent", client.requests_sent());
            Ok(finish(&report, true))
        }
        Command::Audit { curated } => {
            let curated = curated_path(curated, config)?;
            let report = jobs::audit(config, region, &curated)?;
            report.log();
            Ok(report.summary())
        }
    }
}

fn curated_path(arg: &Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    arg.clone()
        .or_else(|| config.paths.curated.clone())
        .context("No curated list given (--curated or paths.curated)")
}

fn finish(report: &RunReport, list_unresolved: bool) -> String {
    report.log(list_unresolved);
    report.details(NOTIFY_LIST_LIMIT)
}
