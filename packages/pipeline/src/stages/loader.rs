//! Catalog loader.
//!
//! Fetches every configured partition from the dataset source, tags
//! entries with their partition, filters to the supported extension
//! class, and replaces the canonical record table wholesale. The
//! replace is all-or-nothing from the caller's perspective: the full
//! in-memory set is built first, and any fetch failure aborts before
//! a single row is written.

use std::sync::Arc;

use corpus::error::Result;
use corpus::traits::catalog::CatalogSource;
use corpus::types::SourcePartition;

use crate::records::{CanonicalRecord, RecordStore};

/// Outcome of one load run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Records materialized into the table.
    pub loaded: usize,
    /// Catalog entries dropped by the extension filter.
    pub dropped: usize,
}

/// Populates the canonical record store for one cohort.
pub struct CatalogLoader {
    source: Arc<dyn CatalogSource>,
    records: Arc<dyn RecordStore>,
    partitions: Vec<SourcePartition>,
    supported_extension: String,
}

impl CatalogLoader {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        records: Arc<dyn RecordStore>,
        partitions: Vec<SourcePartition>,
        supported_extension: impl Into<String>,
    ) -> Self {
        Self {
            source,
            records,
            partitions,
            supported_extension: supported_extension.into(),
        }
    }

    /// Load one cohort. Destructive: the prior cohort's table, and any
    /// in-flight extraction state it carried, is discarded.
    pub async fn run(&self) -> Result<LoadReport> {
        let mut cohort = Vec::new();
        let mut dropped = 0;

        for partition in &self.partitions {
            // Any partition failing aborts the load with nothing written.
            let entries = self.source.fetch_catalog(*partition).await?;
            tracing::info!(
                partition = %partition,
                entries = entries.len(),
                "fetched catalog partition"
            );

            for entry in entries {
                if !entry.has_extension(&self.supported_extension) {
                    dropped += 1;
                    continue;
                }
                cohort.push(CanonicalRecord {
                    task_id: entry.task_id,
                    question: entry.question,
                    level: entry.level,
                    final_answer: entry.final_answer,
                    file_name: entry.file_name,
                    source_partition: partition.to_string(),
                    annotator_metadata: entry.annotator_metadata.to_string(),
                    raw_url: None,
                    file_extension: None,
                    markdown_url: None,
                    partition_url: None,
                });
            }
        }

        self.records.replace_all(&cohort).await?;

        let report = LoadReport {
            loaded: cohort.len(),
            dropped,
        };
        tracing::info!(
            loaded = report.loaded,
            dropped = report.dropped,
            "cohort loaded"
        );
        Ok(report)
    }
}
