// Main entry point for the corpus pipeline

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pipeline_core::clients::{
    GatewayObjectStore, HfCatalogClient, MarkdownConvertEngine, PartitionApiClient,
};
use pipeline_core::orchestrator::{Orchestrator, OrchestratorOptions, PipelineDeps};
use pipeline_core::records::PgRecordStore;
use pipeline_core::scheduler::start_scheduler;
use pipeline_core::PipelineConfig;

#[derive(Parser)]
#[command(name = "pipeline", about = "Benchmark corpus metadata reconciliation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Execute one pipeline run and exit.
    Run,
    /// Run on the configured cron schedule until interrupted.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pipeline_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting corpus pipeline");

    let cli = Cli::parse();
    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    let orchestrator = Arc::new(build_orchestrator(&config, pool)?);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let report = orchestrator.run().await;
            if !report.succeeded() {
                anyhow::bail!("pipeline run did not fully succeed: {report:?}");
            }
        }
        Command::Serve => {
            let _scheduler = start_scheduler(orchestrator, &config.pipeline_cron)
                .await
                .context("Failed to start scheduler")?;
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for shutdown signal")?;
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}

fn build_orchestrator(config: &PipelineConfig, pool: sqlx::PgPool) -> Result<Orchestrator> {
    let catalog = HfCatalogClient::new(
        &config.dataset_rows_url,
        &config.dataset_resolve_url,
        &config.dataset_name,
        &config.dataset_config,
        config.dataset_token.clone(),
    )?;
    let object_store = GatewayObjectStore::new(
        &config.storage_gateway_url,
        &config.storage_bucket,
        config.storage_token.clone(),
    )?;
    let markdown_engine = MarkdownConvertEngine::new(&config.converter_command)?;
    let partition_engine =
        PartitionApiClient::new(&config.partition_api_url, config.partition_api_key.clone())?;

    let deps = PipelineDeps {
        catalog: Arc::new(catalog),
        object_store: Arc::new(object_store),
        records: Arc::new(PgRecordStore::new(pool)),
        markdown_engine: Arc::new(markdown_engine),
        partition_engine: Arc::new(partition_engine),
    };

    Ok(Orchestrator::new(deps, OrchestratorOptions::from(config)))
}
