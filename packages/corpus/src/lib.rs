//! Collaborator contracts for the benchmark corpus pipeline.
//!
//! The pipeline proper (stages, orchestrator, Postgres record store)
//! lives in the `pipeline` package. This crate holds everything the
//! stages depend on but do not own:
//!
//! - [`error`] - the pipeline error taxonomy
//! - [`types`] - catalog entries and source partitions
//! - [`traits`] - `CatalogSource`, `ObjectStore`, `ExtractionEngine`
//! - [`naming`] - per-engine output naming transforms and their inverses
//! - [`stores`] - in-memory object store
//! - [`testing`] - mock collaborators for tests
//!
//! # Design
//!
//! Every external system the pipeline talks to (dataset catalog, blob
//! storage, the two extraction engines) sits behind a trait, so each
//! stage is testable with fakes and no component reads process-wide
//! state. The naming transforms are explicit injectable values rather
//! than inline string manipulation because the reconciliation step's
//! correctness depends on inverting them exactly.

pub mod error;
pub mod naming;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{PipelineError, Result};
pub use naming::{MarkdownNaming, OutputNaming, PartitionNaming};
pub use stores::MemoryObjectStore;
pub use traits::{
    catalog::CatalogSource,
    engine::ExtractionEngine,
    store::ObjectStore,
};
pub use types::{CatalogEntry, SourcePartition};
