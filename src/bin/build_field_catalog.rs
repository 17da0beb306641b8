//! Crawl field capabilities for an index pattern into the catalog file.

use anyhow::Result;
use clap::Parser;
use es_query_copilot::services::EsClient;
use es_query_copilot::{FieldCatalog, Settings};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "build_field_catalog")]
#[command(about = "Build the field catalog from Elasticsearch field capabilities")]
struct Args {
    /// Index pattern to scan
    #[arg(long, default_value = "orders-*")]
    index: String,

    /// Output path
    #[arg(long, default_value = "data/field_catalog.json")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    dotenv::dotenv().ok();
    // only the ES half of the settings matters here; no LLM key needed
    let settings = Settings::from_lookup(|key| match key {
        "LLM_API_KEY" => Some("unused".to_string()),
        _ => std::env::var(key).ok(),
    })?;

    info!("Connecting to ES at {}...", settings.es_url);
    let es = EsClient::new(&settings)?;

    info!("Fetching mapping for {}...", args.index);
    let mapping = es.mapping(&args.index).await?;
    if mapping.as_object().map_or(true, |m| m.is_empty()) {
        warn!("No index found matching pattern {}", args.index);
        return Ok(());
    }

    info!("Fetching field capabilities...");
    let caps = es.field_caps(&args.index).await?;
    let catalog = FieldCatalog::from_field_caps(&args.index, &caps);
    catalog.save(&args.out)?;

    info!(
        "Catalog saved to {} with {} fields",
        args.out.display(),
        catalog.field_count(&args.index)
    );
    Ok(())
}
