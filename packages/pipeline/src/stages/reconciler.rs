//! Reconciler.
//!
//! Matches one engine's output artifacts back to their originating
//! canonical records. The output artifact carries no task id; the only
//! link is its name, which crossed the engine's naming transform. The
//! reconciler inverts that transform to recover the natural file name
//! and uses it as the lookup key, then upserts the engine's URL column
//! on the matched record.
//!
//! Skip paths, none of which abort the batch:
//! - a key the naming transform cannot invert
//! - a derived name matching no record
//! - a derived name matching more than one record (the same file name
//!   in two partitions; updating an arbitrary one would be silently
//!   wrong, so the collision is logged instead)

use std::sync::Arc;

use corpus::error::{PipelineError, Result};
use corpus::naming::OutputNaming;
use corpus::traits::store::ObjectStore;

use crate::records::{RecordField, RecordStore};

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub matched: usize,
    pub skipped: usize,
}

/// Reconciles one engine's output namespace onto the record table.
pub struct Reconciler {
    store: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    naming: Arc<dyn OutputNaming>,
    output_prefix: String,
    field: RecordField,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        naming: Arc<dyn OutputNaming>,
        output_prefix: impl Into<String>,
        field: RecordField,
    ) -> Self {
        Self {
            store,
            records,
            naming,
            output_prefix: output_prefix.into(),
            field,
        }
    }

    pub async fn run(&self) -> Result<ReconcileReport> {
        let keys = self.store.list(&self.output_prefix).await?;
        let mut report = ReconcileReport {
            matched: 0,
            skipped: 0,
        };

        for key in keys {
            match self.reconcile_one(&key).await {
                Ok(()) => report.matched += 1,
                Err(e @ PipelineError::StoreUnavailable { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(field = %self.field, key = %key, error = %e, "skipping artifact");
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            field = %self.field,
            matched = report.matched,
            skipped = report.skipped,
            "reconciliation complete"
        );
        Ok(report)
    }

    async fn reconcile_one(&self, key: &str) -> Result<()> {
        let artifact_name = key.rsplit('/').next().unwrap_or(key);
        let file_name = self
            .naming
            .invert_output_name(artifact_name)
            .ok_or_else(|| PipelineError::InvalidArtifactName {
                key: key.to_string(),
            })?;

        let matches = self.records.find_by_file_name(&file_name).await?;
        let record = match matches.as_slice() {
            [one] => one,
            [] => {
                return Err(PipelineError::not_found(format!(
                    "no record with file_name {file_name}"
                )))
            }
            many => {
                return Err(PipelineError::AmbiguousFileName {
                    file_name,
                    matches: many.len(),
                })
            }
        };

        let url = self.store.object_url(key);
        self.records
            .update_field(&record.task_id, self.field, &url)
            .await?;
        tracing::debug!(task_id = %record.task_id, field = %self.field, url = %url, "reconciled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus::naming::{MarkdownNaming, PartitionNaming};
    use corpus::stores::MemoryObjectStore;
    use corpus::traits::store::ObjectStore as _;

    use crate::records::{CanonicalRecord, MemoryRecordStore};

    fn record(task_id: &str, file_name: &str, partition: &str) -> CanonicalRecord {
        CanonicalRecord {
            task_id: task_id.into(),
            question: "q".into(),
            level: "1".into(),
            final_answer: "a".into(),
            file_name: file_name.into(),
            source_partition: partition.into(),
            annotator_metadata: "{}".into(),
            raw_url: Some(format!("memory://bucket/corpus_raw/{file_name}")),
            file_extension: Some("pdf".into()),
            markdown_url: None,
            partition_url: None,
        }
    }

    fn markdown_reconciler(
        store: MemoryObjectStore,
        records: Arc<MemoryRecordStore>,
    ) -> Reconciler {
        Reconciler::new(
            Arc::new(store),
            records,
            Arc::new(MarkdownNaming::new("pdf")),
            "markdown_extract/",
            RecordField::MarkdownUrl,
        )
    }

    #[tokio::test]
    async fn matches_across_the_naming_transform() {
        // Output foo.bar.txt must reconcile exactly the record whose
        // natural file name is foo.bar.pdf.
        let records = Arc::new(MemoryRecordStore::new());
        records
            .replace_all(&[
                record("t1", "foo.bar.pdf", "validation"),
                record("t2", "foo.pdf", "validation"),
            ])
            .await
            .unwrap();
        let store = MemoryObjectStore::new();
        store.put("markdown_extract/foo.bar.txt", b"md").await.unwrap();

        let report = markdown_reconciler(store, records.clone()).run().await.unwrap();
        assert_eq!(report, ReconcileReport { matched: 1, skipped: 0 });

        assert_eq!(
            records.get("t1").unwrap().markdown_url.as_deref(),
            Some("memory://bucket/markdown_extract/foo.bar.txt")
        );
        assert!(records.get("t2").unwrap().markdown_url.is_none());
    }

    #[tokio::test]
    async fn unmatched_artifact_is_skipped_without_error() {
        let records = Arc::new(MemoryRecordStore::new());
        records
            .replace_all(&[record("t1", "a.pdf", "test")])
            .await
            .unwrap();
        let store = MemoryObjectStore::new();
        store
            .put("markdown_extract/stranger.txt", b"md")
            .await
            .unwrap();

        let report = markdown_reconciler(store, records.clone()).run().await.unwrap();
        assert_eq!(report, ReconcileReport { matched: 0, skipped: 1 });
        assert!(records.get("t1").unwrap().markdown_url.is_none());
    }

    #[tokio::test]
    async fn uninvertible_artifact_is_skipped() {
        let records = Arc::new(MemoryRecordStore::new());
        records
            .replace_all(&[record("t1", "a.pdf", "test")])
            .await
            .unwrap();
        let store = MemoryObjectStore::new();
        // A .json artifact in the markdown namespace cannot have been
        // produced by the markdown engine.
        store.put("markdown_extract/a.json", b"?").await.unwrap();

        let report = markdown_reconciler(store, records).run().await.unwrap();
        assert_eq!(report, ReconcileReport { matched: 0, skipped: 1 });
    }

    #[tokio::test]
    async fn ambiguous_file_name_is_not_updated() {
        // Same natural file name in both partitions: updating either
        // row would be arbitrary, so neither is touched.
        let records = Arc::new(MemoryRecordStore::new());
        records
            .replace_all(&[
                record("t1", "shared.pdf", "validation"),
                record("t2", "shared.pdf", "test"),
            ])
            .await
            .unwrap();
        let store = MemoryObjectStore::new();
        store.put("markdown_extract/shared.txt", b"md").await.unwrap();

        let report = markdown_reconciler(store, records.clone()).run().await.unwrap();
        assert_eq!(report, ReconcileReport { matched: 0, skipped: 1 });
        assert!(records.get("t1").unwrap().markdown_url.is_none());
        assert!(records.get("t2").unwrap().markdown_url.is_none());
    }

    #[tokio::test]
    async fn rerun_is_idempotent() {
        let records = Arc::new(MemoryRecordStore::new());
        records
            .replace_all(&[record("t1", "a.pdf", "test")])
            .await
            .unwrap();
        let store = MemoryObjectStore::new();
        store
            .put("partition_extract/a.pdf.json", b"elements")
            .await
            .unwrap();

        let reconciler = Reconciler::new(
            Arc::new(store),
            records.clone(),
            Arc::new(PartitionNaming::new()),
            "partition_extract/",
            RecordField::PartitionUrl,
        );

        reconciler.run().await.unwrap();
        let first = records.get("t1").unwrap().partition_url;
        let report = reconciler.run().await.unwrap();
        assert_eq!(report.matched, 1);
        assert_eq!(records.get("t1").unwrap().partition_url, first);
        assert_eq!(records.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn branches_are_independent() {
        // Reconciling the partition branch never touches markdown_url.
        let records = Arc::new(MemoryRecordStore::new());
        records
            .replace_all(&[record("t1", "a.pdf", "test")])
            .await
            .unwrap();
        let store = MemoryObjectStore::new();
        store
            .put("partition_extract/a.pdf.json", b"elements")
            .await
            .unwrap();

        Reconciler::new(
            Arc::new(store),
            records.clone(),
            Arc::new(PartitionNaming::new()),
            "partition_extract/",
            RecordField::PartitionUrl,
        )
        .run()
        .await
        .unwrap();

        let row = records.get("t1").unwrap();
        assert!(row.partition_url.is_some());
        assert!(row.markdown_url.is_none());
    }
}
