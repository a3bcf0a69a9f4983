//! Pipeline configuration.
//!
//! All credentials, endpoints, and namespace prefixes come from the
//! environment, read exactly once in `main` and handed to components
//! at construction. No component reads `std::env` itself.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

/// Configuration for one pipeline process.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // Canonical record store
    pub database_url: String,

    // Dataset source
    pub dataset_rows_url: String,
    pub dataset_resolve_url: String,
    pub dataset_name: String,
    pub dataset_config: String,
    pub dataset_token: Option<String>,

    // Object storage gateway
    pub storage_gateway_url: String,
    pub storage_bucket: String,
    pub storage_token: Option<String>,

    // Object storage namespaces (one per artifact class)
    pub staging_prefix: String,
    pub markdown_prefix: String,
    pub partition_prefix: String,

    /// The single in-scope file extension class, without the dot.
    pub supported_extension: String,

    // Extraction engines
    pub converter_command: String,
    pub partition_api_url: String,
    pub partition_api_key: Option<String>,

    // Orchestrator retry policy
    pub node_retry_attempts: u32,
    pub node_retry_delay: Duration,

    // Scheduler
    pub pipeline_cron: String,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            dataset_rows_url: env::var("DATASET_ROWS_URL")
                .unwrap_or_else(|_| "https://datasets-server.huggingface.co/rows".to_string()),
            dataset_resolve_url: env::var("DATASET_RESOLVE_URL")
                .context("DATASET_RESOLVE_URL must be set")?,
            dataset_name: env::var("DATASET_NAME").context("DATASET_NAME must be set")?,
            dataset_config: env::var("DATASET_CONFIG").context("DATASET_CONFIG must be set")?,
            dataset_token: env::var("DATASET_TOKEN").ok(),
            storage_gateway_url: env::var("STORAGE_GATEWAY_URL")
                .context("STORAGE_GATEWAY_URL must be set")?,
            storage_bucket: env::var("STORAGE_BUCKET").context("STORAGE_BUCKET must be set")?,
            storage_token: env::var("STORAGE_TOKEN").ok(),
            staging_prefix: env::var("STAGING_PREFIX")
                .unwrap_or_else(|_| "corpus_raw/".to_string()),
            markdown_prefix: env::var("MARKDOWN_PREFIX")
                .unwrap_or_else(|_| "markdown_extract/".to_string()),
            partition_prefix: env::var("PARTITION_PREFIX")
                .unwrap_or_else(|_| "partition_extract/".to_string()),
            supported_extension: env::var("SUPPORTED_EXTENSION")
                .unwrap_or_else(|_| "pdf".to_string()),
            converter_command: env::var("CONVERTER_COMMAND")
                .context("CONVERTER_COMMAND must be set")?,
            partition_api_url: env::var("PARTITION_API_URL")
                .context("PARTITION_API_URL must be set")?,
            partition_api_key: env::var("PARTITION_API_KEY").ok(),
            node_retry_attempts: env::var("NODE_RETRY_ATTEMPTS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("NODE_RETRY_ATTEMPTS must be a number")?,
            node_retry_delay: Duration::from_secs(
                env::var("NODE_RETRY_DELAY_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .context("NODE_RETRY_DELAY_SECS must be a number")?,
            ),
            pipeline_cron: env::var("PIPELINE_CRON")
                .unwrap_or_else(|_| "0 0 2 * * *".to_string()),
        })
    }
}
