//! Catalog binary
//!
//! Runs one scenario against the file-backed store and the real network.

use catalog::{CatalogConfig, Scenario, ScenarioContext};
use clap::Parser;
use state_kit_http::ReqwestHttpClient;
use state_kit_storage::FileStorage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Reactive state scenarios
#[derive(Debug, Parser)]
#[command(name = "catalog", version, about)]
struct Cli {
    /// Scenario to run
    #[arg(value_enum)]
    scenario: Scenario,

    /// JSON document backing persisted state (overrides CATALOG_STORAGE_PATH)
    #[arg(long)]
    storage_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "catalog=info,state_kit_runtime=info,state_kit_hooks=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = CatalogConfig::from_env()?;
    if let Some(path) = cli.storage_path {
        config = config.with_storage_path(path);
    }
    tracing::debug!(?config, "Loaded configuration");

    let storage = Arc::new(FileStorage::open(&config.storage_path)?);
    let http = Arc::new(ReqwestHttpClient::new(config.request_timeout())?);
    let ctx = ScenarioContext::new(storage, http, config);

    println!("=== {} ===\n", cli.scenario.title());

    for line in cli.scenario.run(&ctx).await? {
        println!("{line}");
    }

    Ok(())
}
