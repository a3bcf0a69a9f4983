//! Testing utilities including mock collaborators.
//!
//! These let the pipeline stages and orchestrator be exercised without
//! a real dataset API, storage gateway, or extraction engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{PipelineError, Result};
use crate::traits::{catalog::CatalogSource, engine::ExtractionEngine};
use crate::types::{CatalogEntry, SourcePartition};

/// A mock dataset source backed by in-memory maps.
///
/// Catalog entries and file bytes are registered per partition; files
/// not registered fail with `NotFound`, which is how stager skip paths
/// are tested. Whole-catalog failures can be injected for a fixed
/// number of calls to exercise node-level retry.
#[derive(Default)]
pub struct MockCatalogSource {
    entries: Arc<RwLock<HashMap<SourcePartition, Vec<CatalogEntry>>>>,
    files: Arc<RwLock<HashMap<(SourcePartition, String), Vec<u8>>>>,
    catalog_failures_remaining: Arc<AtomicUsize>,
    catalog_calls: Arc<AtomicUsize>,
}

impl MockCatalogSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalog entry in a partition.
    pub fn with_entry(self, partition: SourcePartition, entry: CatalogEntry) -> Self {
        self.entries
            .write()
            .unwrap()
            .entry(partition)
            .or_default()
            .push(entry);
        self
    }

    /// Register raw bytes for a file in a partition.
    pub fn with_file(
        self,
        partition: SourcePartition,
        file_name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.files
            .write()
            .unwrap()
            .insert((partition, file_name.into()), bytes.into());
        self
    }

    /// Make the next `n` `fetch_catalog` calls fail transiently.
    pub fn with_catalog_failures(self, n: usize) -> Self {
        self.catalog_failures_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// How many times `fetch_catalog` has been called.
    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    async fn fetch_catalog(&self, partition: SourcePartition) -> Result<Vec<CatalogEntry>> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .catalog_failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(PipelineError::transient("injected catalog failure"));
        }
        Ok(self
            .entries
            .read()
            .unwrap()
            .get(&partition)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_bytes(&self, partition: SourcePartition, file_name: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .unwrap()
            .get(&(partition, file_name.to_string()))
            .cloned()
            .ok_or_else(|| PipelineError::not_found(format!("{partition}/{file_name}")))
    }

    fn name(&self) -> &str {
        "mock-catalog"
    }
}

/// A mock extraction engine producing deterministic output.
///
/// The output is `"<name>:<file_name>"` as bytes, so tests can assert
/// which engine processed which input. Per-document failures can be
/// injected by file name.
pub struct MockExtractionEngine {
    name: String,
    failing_files: Arc<RwLock<Vec<String>>>,
    extract_calls: Arc<AtomicUsize>,
}

impl MockExtractionEngine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failing_files: Arc::new(RwLock::new(Vec::new())),
            extract_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make extraction of one file fail with an engine error.
    pub fn with_failing_file(self, file_name: impl Into<String>) -> Self {
        self.failing_files.write().unwrap().push(file_name.into());
        self
    }

    /// How many times `extract` has been called.
    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionEngine for MockExtractionEngine {
    async fn extract(&self, file_name: &str, _input: &[u8]) -> Result<Vec<u8>> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failing_files
            .read()
            .unwrap()
            .iter()
            .any(|f| f == file_name)
        {
            return Err(PipelineError::engine(format!(
                "injected failure for {file_name}"
            )));
        }
        Ok(format!("{}:{file_name}", self.name).into_bytes())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(task_id: &str, file_name: &str) -> CatalogEntry {
        CatalogEntry {
            task_id: task_id.into(),
            question: "q".into(),
            level: "1".into(),
            final_answer: "a".into(),
            file_name: file_name.into(),
            annotator_metadata: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn catalog_failures_are_consumed_in_order() {
        let source = MockCatalogSource::new()
            .with_entry(SourcePartition::Test, entry("t1", "a.pdf"))
            .with_catalog_failures(1);

        let err = source.fetch_catalog(SourcePartition::Test).await.unwrap_err();
        assert!(err.is_retryable());

        let entries = source.fetch_catalog(SourcePartition::Test).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(source.catalog_calls(), 2);
    }

    #[tokio::test]
    async fn unregistered_file_is_not_found() {
        let source = MockCatalogSource::new().with_file(SourcePartition::Test, "a.pdf", b"x".to_vec());

        assert!(source
            .fetch_bytes(SourcePartition::Test, "a.pdf")
            .await
            .is_ok());
        let err = source
            .fetch_bytes(SourcePartition::Validation, "a.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn engine_output_is_deterministic() {
        let engine = MockExtractionEngine::new("markdown").with_failing_file("bad.pdf");

        let out = engine.extract("a.pdf", b"raw").await.unwrap();
        assert_eq!(out, b"markdown:a.pdf");
        assert!(engine.extract("bad.pdf", b"raw").await.is_err());
        assert_eq!(engine.extract_calls(), 2);
    }
}
