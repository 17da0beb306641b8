use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use es_query_copilot::api;
use es_query_copilot::{Copilot, Query, RiskScorer, Settings};
use std::io::Read;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "es-query-copilot")]
#[command(version, about = "Natural language to Elasticsearch DSL with validation, repair and risk gating")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Listen port (default: APP_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Score a query offline and print the assessment
    Risk {
        /// Query JSON file, or - for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Validate a query against Elasticsearch, repairing it if needed
    Validate {
        /// Target index (default: ES_DEFAULT_INDEX)
        #[arg(short, long)]
        index: Option<String>,
        /// Query JSON file, or - for stdin
        #[arg(default_value = "-")]
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => {
            let settings = Settings::from_env()?;
            let port = port.unwrap_or(settings.app_port);
            info!("Starting ES Query Copilot ({})", settings.app_env);
            let copilot = Arc::new(Copilot::from_settings(&settings)?);
            api::serve(copilot, port).await?;
        }
        Command::Risk { input } => {
            let query = read_query(&input)?;
            let assessment = RiskScorer::new().evaluate(&query);
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }
        Command::Validate { index, input } => {
            let settings = Settings::from_env()?;
            let index = index.unwrap_or_else(|| settings.es_default_index.clone());
            let query = read_query(&input)?;
            let copilot = Copilot::from_settings(&settings)?;
            let report = copilot.validate(&index, query).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn read_query(input: &str) -> Result<Query> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?
    };
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", input))
}
