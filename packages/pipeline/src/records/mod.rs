//! Canonical record model and store.
//!
//! One canonical record per in-scope document. The record is created
//! in bulk by the loader (a full-table replace per cohort) and then
//! mutated field by field: the stager sets `raw_url` and
//! `file_extension`, each reconciler branch sets its own URL column.
//! Every mutation is a single-row, single-column idempotent upsert, so
//! retried runs and concurrent branches never need cross-row locking.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use corpus::error::Result;
use corpus::types::SourcePartition;

pub use memory::MemoryRecordStore;
pub use pg::PgRecordStore;

/// The per-document row that accumulates state across pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CanonicalRecord {
    /// Opaque primary key from the dataset source; immutable.
    pub task_id: String,
    pub question: String,
    pub level: String,
    pub final_answer: String,
    /// Natural file name; the reconciliation matching key.
    pub file_name: String,
    /// `validation` or `test`; see [`CanonicalRecord::partition`].
    pub source_partition: String,
    /// Opaque serialized JSON blob, never interpreted.
    pub annotator_metadata: String,
    /// Set once by the stager.
    pub raw_url: Option<String>,
    /// Set once by the stager; substring after the final `.`.
    pub file_extension: Option<String>,
    /// Set by the markdown reconciler branch.
    pub markdown_url: Option<String>,
    /// Set by the partition reconciler branch.
    pub partition_url: Option<String>,
}

impl CanonicalRecord {
    /// Parse the stored partition tag.
    pub fn partition(&self) -> Result<SourcePartition> {
        self.source_partition.parse()
    }
}

/// The derived columns stages are allowed to upsert.
///
/// A closed enum rather than a raw column string: `update_field` is
/// built with `format!` on the column name, so the set of reachable
/// columns must be fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    RawUrl,
    FileExtension,
    MarkdownUrl,
    PartitionUrl,
}

impl RecordField {
    pub fn column(&self) -> &'static str {
        match self {
            RecordField::RawUrl => "raw_url",
            RecordField::FileExtension => "file_extension",
            RecordField::MarkdownUrl => "markdown_url",
            RecordField::PartitionUrl => "partition_url",
        }
    }
}

impl std::fmt::Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// The canonical record table.
///
/// Implementations surface connection loss as `StoreUnavailable` and
/// hold no retry logic of their own; the orchestrator retries nodes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Atomically drop and repopulate the table for a new cohort.
    ///
    /// Destructive: any in-flight state from a prior cohort is
    /// discarded with the table.
    async fn replace_all(&self, records: &[CanonicalRecord]) -> Result<()>;

    /// Every record, for stager scans.
    async fn list_all(&self) -> Result<Vec<CanonicalRecord>>;

    /// Point upsert of one derived field.
    ///
    /// Idempotent: calling twice with the same value succeeds both
    /// times. Calls on different task ids never block each other.
    async fn update_field(&self, task_id: &str, field: RecordField, value: &str) -> Result<()>;

    /// All records whose natural file name matches.
    ///
    /// Returns a Vec so the reconciler can observe ambiguity (the same
    /// file name in more than one partition) instead of updating an
    /// arbitrary row.
    async fn find_by_file_name(&self, file_name: &str) -> Result<Vec<CanonicalRecord>>;
}
