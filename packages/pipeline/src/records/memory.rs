//! In-memory canonical record store.
//!
//! Used by the unit and integration suites so stage logic can be
//! exercised without Postgres. Failure injection covers the
//! `StoreUnavailable` abort paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use corpus::error::{PipelineError, Result};

use super::{CanonicalRecord, RecordField, RecordStore};

/// An in-memory [`RecordStore`].
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    rows: Arc<RwLock<Vec<CanonicalRecord>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Direct row lookup for test assertions.
    pub fn get(&self, task_id: &str) -> Option<CanonicalRecord> {
        self.rows
            .read()
            .unwrap()
            .iter()
            .find(|r| r.task_id == task_id)
            .cloned()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PipelineError::store_unavailable("injected outage"));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn replace_all(&self, records: &[CanonicalRecord]) -> Result<()> {
        self.check_available()?;
        *self.rows.write().unwrap() = records.to_vec();
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<CanonicalRecord>> {
        self.check_available()?;
        Ok(self.rows.read().unwrap().clone())
    }

    async fn update_field(&self, task_id: &str, field: RecordField, value: &str) -> Result<()> {
        self.check_available()?;
        let mut rows = self.rows.write().unwrap();
        for row in rows.iter_mut().filter(|r| r.task_id == task_id) {
            let slot = match field {
                RecordField::RawUrl => &mut row.raw_url,
                RecordField::FileExtension => &mut row.file_extension,
                RecordField::MarkdownUrl => &mut row.markdown_url,
                RecordField::PartitionUrl => &mut row.partition_url,
            };
            *slot = Some(value.to_string());
        }
        Ok(())
    }

    async fn find_by_file_name(&self, file_name: &str) -> Result<Vec<CanonicalRecord>> {
        self.check_available()?;
        Ok(self
            .rows
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.file_name == file_name)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(task_id: &str, file_name: &str, partition: &str) -> CanonicalRecord {
        CanonicalRecord {
            task_id: task_id.into(),
            question: "q".into(),
            level: "1".into(),
            final_answer: "a".into(),
            file_name: file_name.into(),
            source_partition: partition.into(),
            annotator_metadata: "{}".into(),
            raw_url: None,
            file_extension: None,
            markdown_url: None,
            partition_url: None,
        }
    }

    #[tokio::test]
    async fn replace_all_round_trips() {
        let store = MemoryRecordStore::new();
        let records = vec![record("t1", "a.pdf", "validation"), record("t2", "b.pdf", "test")];
        store.replace_all(&records).await.unwrap();

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].task_id, "t1");
        assert!(listed.iter().all(|r| r.raw_url.is_none()));

        // A second replace discards the prior cohort wholesale.
        store.replace_all(&[record("t3", "c.pdf", "test")]).await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_field_is_idempotent() {
        let store = MemoryRecordStore::new();
        store.replace_all(&[record("t1", "a.pdf", "test")]).await.unwrap();

        store
            .update_field("t1", RecordField::RawUrl, "http://blob/a.pdf")
            .await
            .unwrap();
        store
            .update_field("t1", RecordField::RawUrl, "http://blob/a.pdf")
            .await
            .unwrap();

        assert_eq!(
            store.get("t1").unwrap().raw_url.as_deref(),
            Some("http://blob/a.pdf")
        );
    }

    #[tokio::test]
    async fn find_by_file_name_returns_all_matches() {
        let store = MemoryRecordStore::new();
        store
            .replace_all(&[
                record("t1", "shared.pdf", "validation"),
                record("t2", "shared.pdf", "test"),
                record("t3", "other.pdf", "test"),
            ])
            .await
            .unwrap();

        assert_eq!(store.find_by_file_name("shared.pdf").await.unwrap().len(), 2);
        assert_eq!(store.find_by_file_name("other.pdf").await.unwrap().len(), 1);
        assert!(store.find_by_file_name("missing.pdf").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_outage_surfaces_as_store_unavailable() {
        let store = MemoryRecordStore::new();
        store.set_unavailable(true);
        let err = store.list_all().await.unwrap_err();
        assert!(matches!(err, PipelineError::StoreUnavailable { .. }));
        assert!(err.is_retryable());
    }
}
