//! End-to-end pipeline tests against in-memory collaborators.
//!
//! Exercises the full DAG the way a scheduled run would: load a
//! cohort, stage raw files, run both extraction branches, reconcile,
//! and verify the canonical records accumulated the right state.

use std::sync::Arc;
use std::time::Duration;

use corpus::stores::MemoryObjectStore;
use corpus::testing::{MockCatalogSource, MockExtractionEngine};
use corpus::traits::store::ObjectStore;
use corpus::types::{CatalogEntry, SourcePartition};

use pipeline_core::orchestrator::{Orchestrator, OrchestratorOptions, PipelineDeps};
use pipeline_core::records::{MemoryRecordStore, RecordStore};

fn entry(task_id: &str, file_name: &str) -> CatalogEntry {
    CatalogEntry {
        task_id: task_id.into(),
        question: format!("question {task_id}"),
        level: "2".into(),
        final_answer: "answer".into(),
        file_name: file_name.into(),
        annotator_metadata: serde_json::json!({"steps": 1}),
    }
}

fn options() -> OrchestratorOptions {
    OrchestratorOptions {
        staging_prefix: "corpus_raw/".into(),
        markdown_prefix: "markdown_extract/".into(),
        partition_prefix: "partition_extract/".into(),
        supported_extension: "pdf".into(),
        retry_attempts: 2,
        retry_delay: Duration::from_millis(0),
    }
}

/// Catalog: 3 entries, 2 in scope; raw bytes exist for only one of
/// the 2. This is the partial-failure cohort from the design's test
/// scenarios.
fn partial_cohort() -> MockCatalogSource {
    MockCatalogSource::new()
        .with_entry(SourcePartition::Validation, entry("t-staged", "report.pdf"))
        .with_entry(SourcePartition::Test, entry("t-missing", "lost.pdf"))
        .with_entry(SourcePartition::Test, entry("t-filtered", "sheet.xlsx"))
        .with_file(SourcePartition::Validation, "report.pdf", b"%PDF-1.7".to_vec())
}

fn build(
    catalog: MockCatalogSource,
    store: MemoryObjectStore,
    records: Arc<MemoryRecordStore>,
) -> Orchestrator {
    Orchestrator::new(
        PipelineDeps {
            catalog: Arc::new(catalog),
            object_store: Arc::new(store),
            records,
            markdown_engine: Arc::new(MockExtractionEngine::new("markdown")),
            partition_engine: Arc::new(MockExtractionEngine::new("partition")),
        },
        options(),
    )
}

#[tokio::test]
async fn full_run_processes_every_staged_document() {
    let records = Arc::new(MemoryRecordStore::new());
    let store = MemoryObjectStore::new();
    let orchestrator = build(partial_cohort(), store.clone(), records.clone());

    let report = orchestrator.run().await;
    // Per-document failures (the missing raw file) never fail a node.
    assert!(report.succeeded(), "{report:?}");

    // The filter dropped the spreadsheet at load time.
    let rows = records.list_all().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(records.get("t-filtered").is_none());

    // The staged document accumulated every derived field.
    let staged = records.get("t-staged").unwrap();
    assert_eq!(
        staged.raw_url.as_deref(),
        Some("memory://bucket/corpus_raw/report.pdf")
    );
    assert_eq!(staged.file_extension.as_deref(), Some("pdf"));
    assert_eq!(
        staged.markdown_url.as_deref(),
        Some("memory://bucket/markdown_extract/report.txt")
    );
    assert_eq!(
        staged.partition_url.as_deref(),
        Some("memory://bucket/partition_extract/report.pdf.json")
    );

    // Derived artifacts live under their exclusive namespaces.
    assert_eq!(
        store.get("markdown_extract/report.txt").await.unwrap(),
        b"markdown:report.pdf"
    );
    assert_eq!(
        store.get("partition_extract/report.pdf.json").await.unwrap(),
        b"partition:report.pdf"
    );
}

#[tokio::test]
async fn unstaged_documents_never_acquire_extraction_urls() {
    let records = Arc::new(MemoryRecordStore::new());
    let orchestrator = build(partial_cohort(), MemoryObjectStore::new(), records.clone());

    orchestrator.run().await;

    // Invariant: null raw_url implies null extraction URLs, end to
    // end, because the drivers only ever see staged artifacts.
    for row in records.list_all().await.unwrap() {
        if row.raw_url.is_none() {
            assert!(row.file_extension.is_none(), "{}", row.task_id);
            assert!(row.markdown_url.is_none(), "{}", row.task_id);
            assert!(row.partition_url.is_none(), "{}", row.task_id);
        }
    }
    let missing = records.get("t-missing").unwrap();
    assert!(missing.raw_url.is_none());
}

#[tokio::test]
async fn mixed_case_extensions_never_strand_a_record() {
    let records = Arc::new(MemoryRecordStore::new());
    let store = MemoryObjectStore::new();
    let catalog = MockCatalogSource::new()
        .with_entry(SourcePartition::Validation, entry("t-upper", "report.PDF"))
        .with_entry(SourcePartition::Validation, entry("t-lower", "report.pdf"))
        .with_file(SourcePartition::Validation, "report.PDF", b"%PDF-1.7".to_vec())
        .with_file(SourcePartition::Validation, "report.pdf", b"%PDF-1.7".to_vec());

    let report = build(catalog, store, records.clone()).run().await;
    assert!(report.succeeded(), "{report:?}");

    // The load filter and the drivers agree on extension case: an
    // entry the drivers would never pick up is dropped at load, not
    // staged and then left without extraction URLs.
    assert!(records.get("t-upper").is_none());
    let lower = records.get("t-lower").unwrap();
    assert!(lower.markdown_url.is_some());
    assert!(lower.partition_url.is_some());

    // The invariant holds for every materialized record.
    for row in records.list_all().await.unwrap() {
        if row.raw_url.is_some() {
            assert!(row.markdown_url.is_some(), "{}", row.task_id);
            assert!(row.partition_url.is_some(), "{}", row.task_id);
        }
    }
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let records = Arc::new(MemoryRecordStore::new());
    let store = MemoryObjectStore::new();

    let first = build(partial_cohort(), store.clone(), records.clone());
    first.run().await;
    let after_first = records.list_all().await.unwrap();
    let objects_after_first = store.len();

    let second = build(partial_cohort(), store.clone(), records.clone());
    let report = second.run().await;
    assert!(report.succeeded(), "{report:?}");

    let after_second = records.list_all().await.unwrap();
    assert_eq!(after_first.len(), after_second.len());
    for (a, b) in after_first.iter().zip(after_second.iter()) {
        assert_eq!(a.task_id, b.task_id);
        assert_eq!(a.raw_url, b.raw_url);
        assert_eq!(a.file_extension, b.file_extension);
        assert_eq!(a.markdown_url, b.markdown_url);
        assert_eq!(a.partition_url, b.partition_url);
    }
    assert_eq!(store.len(), objects_after_first);
}

#[tokio::test]
async fn reload_discards_prior_cohort_state() {
    let records = Arc::new(MemoryRecordStore::new());
    let store = MemoryObjectStore::new();

    build(partial_cohort(), store.clone(), records.clone())
        .run()
        .await;
    assert!(records.get("t-staged").unwrap().markdown_url.is_some());

    // Next cohort has a different document set; the old records go
    // with the table.
    let next = MockCatalogSource::new()
        .with_entry(SourcePartition::Test, entry("t-new", "fresh.pdf"))
        .with_file(SourcePartition::Test, "fresh.pdf", b"%PDF-1.7".to_vec());
    let report = build(next, store.clone(), records.clone()).run().await;
    assert!(report.succeeded(), "{report:?}");

    assert!(records.get("t-staged").is_none());
    let fresh = records.get("t-new").unwrap();
    assert!(fresh.raw_url.is_some());
    assert!(fresh.markdown_url.is_some());
}

#[tokio::test]
async fn downstream_readers_can_mint_timed_urls_for_any_artifact() {
    let records = Arc::new(MemoryRecordStore::new());
    let store = MemoryObjectStore::new();
    build(partial_cohort(), store.clone(), records.clone())
        .run()
        .await;

    // The downstream app resolves a record's artifact to a
    // time-limited URL via the object store contract.
    for key in [
        "corpus_raw/report.pdf",
        "markdown_extract/report.txt",
        "partition_extract/report.pdf.json",
    ] {
        let url = store
            .presigned_url(key, Duration::from_secs(600))
            .await
            .unwrap();
        assert!(url.contains(key));
        assert!(url.ends_with("expires=600"));
    }
}
