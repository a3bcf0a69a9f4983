//! Raw material stager.
//!
//! For every canonical record, fetch the raw file from the dataset
//! source and copy it into the staging namespace of object storage,
//! then record the content URL and file extension on the record. One
//! bad file never blocks the cohort: per-record failures are logged
//! and skipped. Re-running overwrites the same keys with the same
//! content and re-issues the same field updates.

use std::sync::Arc;

use corpus::error::{PipelineError, Result};
use corpus::traits::{catalog::CatalogSource, store::ObjectStore};

use crate::records::{CanonicalRecord, RecordField, RecordStore};

/// Outcome of one staging run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub staged: usize,
    pub skipped: usize,
}

/// Copies raw source files into the pipeline's own object storage.
pub struct RawStager {
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    staging_prefix: String,
}

impl RawStager {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        staging_prefix: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            records,
            staging_prefix: staging_prefix.into(),
        }
    }

    pub async fn run(&self) -> Result<StageReport> {
        let all = self.records.list_all().await?;
        let mut report = StageReport {
            staged: 0,
            skipped: 0,
        };

        for record in &all {
            match self.stage_one(record).await {
                Ok(url) => {
                    tracing::info!(task_id = %record.task_id, url = %url, "staged raw file");
                    report.staged += 1;
                }
                // A record-store outage means every remaining update
                // would fail too; abort the node for retry.
                Err(e @ PipelineError::StoreUnavailable { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        task_id = %record.task_id,
                        file_name = %record.file_name,
                        error = %e,
                        "skipping record"
                    );
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(staged = report.staged, skipped = report.skipped, "staging complete");
        Ok(report)
    }

    async fn stage_one(&self, record: &CanonicalRecord) -> Result<String> {
        let partition = record.partition()?;
        let bytes = self.source.fetch_bytes(partition, &record.file_name).await?;

        let key = format!("{}{}", self.staging_prefix, record.file_name);
        let url = self.store.put(&key, &bytes).await?;

        self.records
            .update_field(&record.task_id, RecordField::RawUrl, &url)
            .await?;
        self.records
            .update_field(
                &record.task_id,
                RecordField::FileExtension,
                file_extension(&record.file_name),
            )
            .await?;

        Ok(url)
    }
}

/// Substring after the final `.`, empty when there is no dot.
fn file_extension(file_name: &str) -> &str {
    file_name.rsplit_once('.').map_or("", |(_, ext)| ext)
}
